//! The `info` command: database statistics.

use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::db::{jobs, migrations, videos};
use crate::output::format::OutputMode;

pub fn run(conn: &Connection, db_path: &Path, mode: OutputMode) -> Result<()> {
    let video_count = videos::count_videos(conn)?;
    let job_count = jobs::count_jobs(conn)?;
    let status_counts = videos::transcript_status_counts(conn)?;
    let seasons = videos::get_available_seasons(conn)?;
    let schema_version = migrations::get_schema_version(conn)?;
    let db_size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    match mode {
        OutputMode::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "db_path": db_path.display().to_string(),
                    "db_size_bytes": db_size,
                    "schema_version": schema_version,
                    "videos": video_count,
                    "jobs": job_count,
                    "seasons": seasons,
                    "transcript_status": status_counts,
                })
            );
        }
        OutputMode::Tty => {
            println!("Database:       {}", db_path.display());
            println!("Size:           {} bytes", db_size);
            println!("Schema version: {}", schema_version);
            println!("Videos:         {}", video_count);
            println!("Jobs:           {}", job_count);
            let season_list: Vec<String> = seasons.iter().map(|s| s.to_string()).collect();
            println!(
                "Seasons:        {}",
                if season_list.is_empty() {
                    "-".to_string()
                } else {
                    season_list.join(", ")
                }
            );
            if !status_counts.is_empty() {
                println!("Transcripts:");
                for (status, count) in &status_counts {
                    println!("  {:<20} {}", status, count);
                }
            }
        }
    }

    Ok(())
}
