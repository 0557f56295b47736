//! The collection orchestrator: one job, end to end.
//!
//! Discovery, reconciliation, persistence and transcript retrieval run as a
//! single blocking sequence under one job id. Store failures abort the run
//! and mark the job `failed`; everything already persisted stays put.

use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Result};
use log::{debug, warn};
use rusqlite::Connection;

use super::config::CollectorConfig;
use super::discovery::{discover_fallback, discover_official};
use super::reconcile::{dedupe, enrich, merge_seeds, sort_candidates};
use super::transcript::fetch_transcript;
use super::{pause_range_ms, truncate_chars, LogSink, Seed};
use crate::api::{TranscriptSource, VideoPlatform};
use crate::db::jobs::{self, JobCounters};
use crate::db::videos;
use crate::models::{Candidate, JobStatus, RunSummary, TranscriptStatus};
use crate::parse::normalize_seasons;

/// Caller-supplied switches for one run.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub seasons: Vec<u32>,
    pub include_fallback: bool,
    pub dry_run: bool,
    pub force_refresh: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        CollectOptions {
            seasons: Vec::new(),
            include_fallback: true,
            dry_run: false,
            force_refresh: false,
        }
    }
}

/// Drives the pipeline against one database and one pair of upstream
/// clients.
pub struct Collector<'a> {
    conn: &'a Connection,
    platform: &'a dyn VideoPlatform,
    transcripts: &'a dyn TranscriptSource,
    config: CollectorConfig,
}

#[derive(Default)]
struct RunCounters {
    job: JobCounters,
    fail_reasons: BTreeMap<String, u64>,
}

impl<'a> Collector<'a> {
    pub fn new(
        conn: &'a Connection,
        platform: &'a dyn VideoPlatform,
        transcripts: &'a dyn TranscriptSource,
        config: CollectorConfig,
    ) -> Self {
        Collector {
            conn,
            platform,
            transcripts,
            config,
        }
    }

    /// Run one collection job. Returns the run summary on success; on an
    /// unhandled failure the job record is closed as `failed` (with whatever
    /// counters were reached) and the error is handed back to the caller.
    pub fn collect(&self, options: &CollectOptions, sink: &mut dyn LogSink) -> Result<RunSummary> {
        let seasons = normalize_seasons(&options.seasons);
        if seasons.is_empty() {
            bail!("at least one season in 1..=29 must be selected");
        }

        let job_id = jobs::create_job(
            self.conn,
            &seasons,
            options.include_fallback,
            options.dry_run,
        )?;

        let mut logger = JobLogger {
            conn: self.conn,
            job_id: job_id.clone(),
            forward: sink,
        };
        let mut counters = RunCounters::default();

        match self.run_pipeline(&seasons, options, &mut logger, &mut counters) {
            Ok(()) => {
                jobs::finish_job(self.conn, &job_id, JobStatus::Completed, counters.job)?;
                logger.log("INFO", "Collection job completed");

                Ok(RunSummary {
                    job_id,
                    seasons: seasons.clone(),
                    total_candidates: counters.job.total_candidates,
                    kept_candidates: counters.job.kept_candidates,
                    transcript_success: counters.job.transcript_success,
                    transcript_fail: counters.job.transcript_fail,
                    fail_reasons: counters.fail_reasons,
                    season_summary: videos::get_season_summary(self.conn, Some(&seasons))?,
                })
            }
            Err(e) => {
                // Best effort: the same fault that broke the pipeline may
                // also break these writes, and the original error matters
                // more.
                if let Err(finish_err) =
                    jobs::finish_job(self.conn, &job_id, JobStatus::Failed, counters.job)
                {
                    warn!("failed to mark job {} as failed: {}", job_id, finish_err);
                }
                logger.log("ERROR", &format!("Collection job failed: {}", e));
                Err(e)
            }
        }
    }

    fn run_pipeline(
        &self,
        seasons: &[u32],
        options: &CollectOptions,
        logger: &mut JobLogger<'_, '_>,
        counters: &mut RunCounters,
    ) -> Result<()> {
        logger.log(
            "INFO",
            &format!("Collection started for seasons {}", season_label(seasons)),
        );

        let official = discover_official(self.platform, &self.config, seasons, logger);
        let coverage = count_by_season(&official);
        let missing: Vec<u32> = seasons
            .iter()
            .copied()
            .filter(|season| coverage.get(season).copied().unwrap_or(0) == 0)
            .collect();

        let fallback = if !missing.is_empty() && options.include_fallback {
            logger.log(
                "INFO",
                &format!(
                    "No official coverage for seasons {}; running fallback search",
                    season_label(&missing)
                ),
            );
            discover_fallback(self.platform, &self.config, &missing, logger)
        } else {
            if !missing.is_empty() {
                logger.log(
                    "INFO",
                    &format!(
                        "Seasons {} have no official coverage; fallback search is disabled",
                        season_label(&missing)
                    ),
                );
            }
            Vec::new()
        };

        let merged = merge_seeds(official, fallback);
        counters.job.total_candidates = merged.len() as u64;
        logger.log(
            "INFO",
            &format!("Enriching {} candidate videos", merged.len()),
        );

        let enriched = enrich(self.platform, &self.config, merged, seasons, logger);
        let enriched_count = enriched.len();
        let mut kept = dedupe(enriched);
        sort_candidates(&mut kept);
        counters.job.kept_candidates = kept.len() as u64;
        logger.log(
            "INFO",
            &format!("Deduplication done: {} -> {}", enriched_count, kept.len()),
        );

        for candidate in &kept {
            videos::upsert_video(self.conn, candidate)?;
        }
        logger.log("INFO", &format!("Stored {} episode records", kept.len()));

        if options.dry_run {
            logger.log("INFO", "Dry-run: transcript retrieval skipped");
            return Ok(());
        }

        self.run_transcript_pass(&kept, options.force_refresh, logger, counters)
    }

    fn run_transcript_pass(
        &self,
        ordered: &[Candidate],
        force_refresh: bool,
        logger: &mut JobLogger<'_, '_>,
        counters: &mut RunCounters,
    ) -> Result<()> {
        let total = ordered.len();

        for (idx, candidate) in ordered.iter().enumerate() {
            let position = idx + 1;

            if !force_refresh && videos::video_has_transcript(self.conn, &candidate.video_id)? {
                if position % 10 == 0 {
                    logger.log(
                        "INFO",
                        &format!("Transcript progress {}/{} (existing kept)", position, total),
                    );
                }
                continue;
            }

            let result = fetch_transcript(self.transcripts, &self.config, &candidate.video_id);
            videos::update_transcript(self.conn, &candidate.video_id, &result)?;

            if result.status == TranscriptStatus::Success {
                counters.job.transcript_success += 1;
            } else {
                counters.job.transcript_fail += 1;
                *counters
                    .fail_reasons
                    .entry(result.status.as_str().to_string())
                    .or_insert(0) += 1;
            }

            if position % 5 == 0 || result.status != TranscriptStatus::Success {
                logger.log(
                    "INFO",
                    &format!(
                        "Transcript {}/{} | season {} | {} | {}",
                        position,
                        total,
                        candidate
                            .season
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| "?".to_string()),
                        truncate_chars(&candidate.title, 36),
                        result.status.as_str()
                    ),
                );
            }

            pause_range_ms(
                self.config.transcript_delay_min_ms,
                self.config.transcript_delay_max_ms,
            );
        }

        Ok(())
    }
}

/// Writes every line to the job's log table, mirrors it to the crate log,
/// and forwards it to the caller's sink.
struct JobLogger<'c, 's> {
    conn: &'c Connection,
    job_id: String,
    forward: &'s mut dyn LogSink,
}

impl LogSink for JobLogger<'_, '_> {
    fn log(&mut self, level: &str, message: &str) {
        if let Err(e) = jobs::log_job(self.conn, &self.job_id, level, message) {
            warn!("failed to append job log: {}", e);
        }
        debug!("[job {}] {}", &self.job_id[..8.min(self.job_id.len())], message);
        self.forward.log(level, message);
    }
}

fn count_by_season(seeds: &[Seed]) -> HashMap<u32, usize> {
    let mut counts = HashMap::new();
    for seed in seeds {
        if let Some(season) = seed.season {
            *counts.entry(season).or_insert(0) += 1;
        }
    }
    counts
}

fn season_label(seasons: &[u32]) -> String {
    let parts: Vec<String> = seasons.iter().map(|s| s.to_string()).collect();
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_by_season_ignores_unknown() {
        let seed = |season| Seed {
            video_id: "x".into(),
            title: String::new(),
            description: String::new(),
            url: String::new(),
            season,
            episode: None,
            source: crate::models::SourceKind::GeneralSearch,
            is_official: false,
            source_priority: 1,
        };
        let counts = count_by_season(&[seed(Some(11)), seed(Some(11)), seed(None)]);
        assert_eq!(counts.get(&11), Some(&2));
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn season_label_formats() {
        assert_eq!(season_label(&[10, 11]), "10, 11");
        assert_eq!(season_label(&[7]), "7");
    }
}
