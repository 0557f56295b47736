//! The `videos` and `show` commands.

use anyhow::{bail, Result};
use colored::Colorize;
use rusqlite::Connection;

use crate::db::videos::{get_video, get_videos, TranscriptFilter};
use crate::models::{TranscriptStatus, VideoRecord};
use crate::output::format::OutputMode;

pub fn list(
    conn: &Connection,
    seasons: Option<&[u32]>,
    transcripts: Option<TranscriptFilter>,
    main_only: bool,
    limit: usize,
    mode: OutputMode,
) -> Result<()> {
    let limit = if limit == 0 { None } else { Some(limit) };
    let records = get_videos(conn, seasons, transcripts, main_only, limit)?;

    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        OutputMode::Tty => {
            if records.is_empty() {
                println!("No videos found.");
                return Ok(());
            }
            for record in &records {
                println!("{}", format_video_line(record));
            }
            println!();
            println!("{} video(s)", records.len());
        }
    }

    Ok(())
}

pub fn show(conn: &Connection, video_id: &str, transcript_only: bool, mode: OutputMode) -> Result<()> {
    let Some(record) = get_video(conn, video_id)? else {
        bail!("No video found with id '{}'", video_id);
    };

    if transcript_only {
        match record.transcript_text.as_deref() {
            Some(text) if !text.is_empty() => println!("{}", text),
            _ => bail!(
                "No transcript stored for '{}' (status: {})",
                video_id,
                record.transcript_status.as_str()
            ),
        }
        return Ok(());
    }

    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        OutputMode::Tty => {
            println!("{}", record.title.bold());
            println!("  id:         {}", record.video_id);
            println!("  url:        {}", record.url);
            println!("  channel:    {}", record.channel_title);
            println!("  season:     {}", label_or_dash(record.season));
            println!("  episode:    {}", label_or_dash(record.episode));
            println!("  class:      {}", record.series_type.as_str());
            println!("  source:     {}", record.source.as_str());
            println!(
                "  uploaded:   {}",
                record.upload_date.as_deref().unwrap_or("-")
            );
            println!(
                "  engagement: {} views, {} likes, {} comments",
                record.view_count, record.like_count, record.comment_count
            );
            println!(
                "  transcript: {}",
                colorize_status(record.transcript_status)
            );
            if let Some(lang) = record.transcript_language.as_deref() {
                if !lang.is_empty() {
                    println!(
                        "              {} ({})",
                        lang,
                        record.transcript_kind.as_deref().unwrap_or("?")
                    );
                }
            }
            if let Some(err) = record.error_message.as_deref() {
                if !err.is_empty() {
                    println!("  last error: {}", err);
                }
            }
        }
    }

    Ok(())
}

fn format_video_line(record: &VideoRecord) -> String {
    let season = record
        .season
        .map(|s| format!("S{:02}", s))
        .unwrap_or_else(|| "S??".to_string());
    let episode = record
        .episode
        .map(|e| format!("E{:03}", e))
        .unwrap_or_else(|| "E???".to_string());
    format!(
        "{} {} {}  {}  [{}]",
        season,
        episode,
        record.upload_date.as_deref().unwrap_or("????-??-??"),
        record.title,
        colorize_status(record.transcript_status)
    )
}

fn label_or_dash(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn colorize_status(status: TranscriptStatus) -> colored::ColoredString {
    let label = status.as_str();
    match status {
        TranscriptStatus::Success => label.green(),
        TranscriptStatus::Pending => label.yellow(),
        TranscriptStatus::Error => label.red(),
        _ => label.dimmed(),
    }
}
