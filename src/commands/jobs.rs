//! The `jobs` and `logs` commands.

use anyhow::{bail, Result};
use colored::Colorize;
use rusqlite::Connection;

use crate::db::jobs::{get_job, get_job_logs, list_recent_jobs};
use crate::models::{JobRecord, JobStatus};
use crate::output::format::OutputMode;

pub fn list(
    conn: &Connection,
    limit: usize,
    status: Option<JobStatus>,
    mode: OutputMode,
) -> Result<()> {
    let jobs = list_recent_jobs(conn, limit, status)?;

    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&jobs)?);
        }
        OutputMode::Tty => {
            if jobs.is_empty() {
                println!("No jobs found.");
                return Ok(());
            }
            for job in &jobs {
                println!("{}", format_job_line(job));
            }
        }
    }

    Ok(())
}

pub fn logs(conn: &Connection, job_id: &str, limit: usize, mode: OutputMode) -> Result<()> {
    if get_job(conn, job_id)?.is_none() {
        bail!("No job found with id '{}'", job_id);
    }

    let lines = get_job_logs(conn, job_id, limit)?;

    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&lines)?);
        }
        OutputMode::Tty => {
            for line in &lines {
                let level = match line.level.as_str() {
                    "ERROR" => line.level.red(),
                    "WARN" => line.level.yellow(),
                    _ => line.level.normal(),
                };
                println!("{}  {:<5}  {}", line.created_at, level, line.message);
            }
        }
    }

    Ok(())
}

fn format_job_line(job: &JobRecord) -> String {
    let status = match job.status {
        JobStatus::Completed => job.status.as_str().green(),
        JobStatus::Failed => job.status.as_str().red(),
        JobStatus::Running => job.status.as_str().yellow(),
    };
    let seasons: Vec<String> = job.seasons.iter().map(|s| s.to_string()).collect();
    format!(
        "{}  {:<9}  seasons [{}]  {} kept / {} found, {} transcripts  {}",
        &job.job_id[..8.min(job.job_id.len())],
        status,
        seasons.join(","),
        job.kept_candidates,
        job.total_candidates,
        job.transcript_success,
        job.started_at
    )
}
