//! The `collect` command: one end-to-end collection run.

use std::path::Path;

use anyhow::Result;
use log::debug;
use rusqlite::Connection;

use crate::api::{InnertubeTranscripts, YtDlpPlatform};
use crate::collect::{CollectOptions, Collector, CollectorConfig, LogSink, NullSink};
use crate::models::RunSummary;
use crate::output::format::OutputMode;

/// Streams job log lines to stderr as they happen.
struct StderrSink;

impl LogSink for StderrSink {
    fn log(&mut self, level: &str, message: &str) {
        if level == "ERROR" || level == "WARN" {
            eprintln!("[solodex] {}: {}", level, message);
        } else {
            eprintln!("[solodex] {}", message);
        }
    }
}

pub fn run(
    conn: &Connection,
    seasons: &[u32],
    no_fallback: bool,
    dry_run: bool,
    force_refresh: bool,
    config_path: Option<&Path>,
    mode: OutputMode,
) -> Result<()> {
    debug!(
        "collect (seasons={:?}, no_fallback={}, dry_run={}, force_refresh={})",
        seasons, no_fallback, dry_run, force_refresh
    );

    let config = match config_path {
        Some(path) => CollectorConfig::load(path)?,
        None => CollectorConfig::default(),
    };

    let platform = YtDlpPlatform::new(config.channel_handle.clone());
    let transcripts = InnertubeTranscripts::new()?;
    let collector = Collector::new(conn, &platform, &transcripts, config);

    let options = CollectOptions {
        seasons: seasons.to_vec(),
        include_fallback: !no_fallback,
        dry_run,
        force_refresh,
    };

    let summary = match mode {
        // In JSON mode the log lines live in the database; stdout carries
        // only the summary document.
        OutputMode::Json => collector.collect(&options, &mut NullSink)?,
        OutputMode::Tty => collector.collect(&options, &mut StderrSink)?,
    };

    print_summary(&summary, dry_run, mode);
    Ok(())
}

fn print_summary(summary: &RunSummary, dry_run: bool, mode: OutputMode) {
    match mode {
        OutputMode::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputMode::Tty => {
            let prefix = if dry_run { "[dry-run] " } else { "" };
            println!();
            println!("{}Collection complete (job {}):", prefix, summary.job_id);
            println!("  Candidates discovered: {}", summary.total_candidates);
            println!("  Candidates kept:       {}", summary.kept_candidates);
            if !dry_run {
                println!("  Transcripts fetched:   {}", summary.transcript_success);
                println!("  Transcripts failed:    {}", summary.transcript_fail);
                for (reason, count) in &summary.fail_reasons {
                    println!("    {}: {}", reason, count);
                }
            }
            if !summary.season_summary.is_empty() {
                println!();
                println!("  Per season:");
                for row in &summary.season_summary {
                    let season = row
                        .season
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    println!(
                        "    Season {:>2}: {} videos, {} transcripts, engagement {:.4}",
                        season, row.total_videos, row.transcript_success, row.avg_engagement
                    );
                }
            }
        }
    }
}
