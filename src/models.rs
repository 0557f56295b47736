//! Domain types for solodex.
//!
//! These types are the single source of truth for all domain data: the
//! candidate records produced by discovery and enrichment, the episode
//! records read back out of the database, and the job bookkeeping types.
//! Raw upstream payload shapes live in `api::types`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use crate::parse::SeriesType;

// ============================================================================
// Video / candidate types
// ============================================================================

/// Where a candidate was discovered. Official sources always outrank general
/// search when duplicates collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    OfficialPlaylist,
    OfficialChannel,
    GeneralSearch,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::OfficialPlaylist => "official_playlist",
            SourceKind::OfficialChannel => "official_channel",
            SourceKind::GeneralSearch => "general_search",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "official_playlist" => SourceKind::OfficialPlaylist,
            "official_channel" => SourceKind::OfficialChannel,
            _ => SourceKind::GeneralSearch,
        }
    }
}

/// A fully enriched episode candidate, validated once at the enrichment
/// boundary and passed downstream as-is.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub channel_title: String,
    pub channel_id: String,
    pub channel_url: String,
    pub duration_seconds: u64,
    pub duration_text: String,
    /// ISO `YYYY-MM-DD`, when the platform reported one.
    pub upload_date: Option<String>,
    pub published_ts: i64,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub series_type: SeriesType,
    pub source: SourceKind,
    pub is_official: bool,
    pub source_priority: i64,
    pub dedupe_key: String,
}

/// Per-video transcript state. `NoTranscript` and `TranscriptsDisabled` are
/// definitive outcomes, not errors; only `Error` is worth re-attempting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptStatus {
    Pending,
    Success,
    NoTranscript,
    TranscriptsDisabled,
    Error,
}

impl TranscriptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptStatus::Pending => "pending",
            TranscriptStatus::Success => "success",
            TranscriptStatus::NoTranscript => "no_transcript",
            TranscriptStatus::TranscriptsDisabled => "transcripts_disabled",
            TranscriptStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "success" => TranscriptStatus::Success,
            "no_transcript" => TranscriptStatus::NoTranscript,
            "transcripts_disabled" => TranscriptStatus::TranscriptsDisabled,
            "error" => TranscriptStatus::Error,
            _ => TranscriptStatus::Pending,
        }
    }
}

/// One timed caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

/// The outcome of one transcript retrieval attempt, persisted verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResult {
    pub status: TranscriptStatus,
    pub language: String,
    /// "manual" or "auto"; empty when nothing was fetched.
    pub kind: String,
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    pub content_hash: String,
    pub error_message: String,
}

impl TranscriptResult {
    pub fn failure(status: TranscriptStatus) -> Self {
        TranscriptResult {
            status,
            language: String::new(),
            kind: String::new(),
            text: String::new(),
            segments: Vec::new(),
            content_hash: String::new(),
            error_message: String::new(),
        }
    }
}

/// An episode record as stored.
#[derive(Debug, Clone, Serialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub channel_title: String,
    pub channel_id: String,
    pub channel_url: String,
    pub description: String,
    pub duration_seconds: u64,
    pub duration_text: String,
    pub upload_date: Option<String>,
    pub published_ts: i64,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub series_type: SeriesType,
    pub source: SourceKind,
    pub is_official: bool,
    pub source_priority: i64,
    pub dedupe_key: Option<String>,
    pub transcript_status: TranscriptStatus,
    pub transcript_language: Option<String>,
    pub transcript_kind: Option<String>,
    pub transcript_text: Option<String>,
    pub transcript_segments: Vec<TranscriptSegment>,
    pub transcript_hash: Option<String>,
    pub transcript_updated_at: Option<String>,
    pub error_message: Option<String>,
    pub discovered_at: String,
    pub updated_at: String,
}

// ============================================================================
// Job types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// One end-to-end collection run.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub seasons: Vec<u32>,
    pub include_fallback: bool,
    pub dry_run: bool,
    pub total_candidates: u64,
    pub kept_candidates: u64,
    pub transcript_success: u64,
    pub transcript_fail: u64,
}

/// One append-only log line belonging to a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobLogLine {
    pub created_at: String,
    pub level: String,
    pub message: String,
}

// ============================================================================
// Run summary
// ============================================================================

/// Per-season aggregate returned with a run summary.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonSummary {
    pub season: Option<u32>,
    pub total_videos: u64,
    pub transcript_success: u64,
    pub avg_engagement: f64,
}

/// What `collect` hands back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub job_id: String,
    pub seasons: Vec<u32>,
    pub total_candidates: u64,
    pub kept_candidates: u64,
    pub transcript_success: u64,
    pub transcript_fail: u64,
    pub fail_reasons: BTreeMap<String, u64>,
    pub season_summary: Vec<SeasonSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_round_trip() {
        for kind in [
            SourceKind::OfficialPlaylist,
            SourceKind::OfficialChannel,
            SourceKind::GeneralSearch,
        ] {
            assert_eq!(SourceKind::parse(kind.as_str()), kind);
        }
        assert_eq!(SourceKind::parse("whatever"), SourceKind::GeneralSearch);
    }

    #[test]
    fn transcript_status_round_trip() {
        for status in [
            TranscriptStatus::Pending,
            TranscriptStatus::Success,
            TranscriptStatus::NoTranscript,
            TranscriptStatus::TranscriptsDisabled,
            TranscriptStatus::Error,
        ] {
            assert_eq!(TranscriptStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn job_status_parse_rejects_unknown() {
        assert_eq!(JobStatus::parse("running"), Some(JobStatus::Running));
        assert_eq!(JobStatus::parse("nope"), None);
    }
}
