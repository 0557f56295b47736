//! Upstream payload shapes and client error taxonomies.

use thiserror::Error;

use crate::models::TranscriptSegment;

/// One entry of a flat listing (playlist index, channel uploads, search
/// results). Listings carry only what the platform returns without visiting
/// the watch page, so almost everything is optional.
#[derive(Debug, Clone, Default)]
pub struct ListingEntry {
    pub id: Option<String>,
    pub url: Option<String>,
    pub title: String,
    pub description: String,
}

/// Full per-video metadata fetched during enrichment.
#[derive(Debug, Clone, Default)]
pub struct VideoDetail {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub duration_seconds: u64,
    pub duration_text: String,
    /// As reported by the platform, typically `YYYYMMDD`.
    pub upload_date: Option<String>,
    pub published_ts: i64,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub channel_title: String,
    pub channel_id: String,
    pub channel_url: String,
}

/// One available caption rendition for a video.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptVariant {
    pub language_code: String,
    pub is_generated: bool,
    pub name: String,
    /// Opaque fetch handle; for the production client this is the timedtext
    /// URL the player response handed out.
    pub base_url: String,
}

/// Errors from the video platform client. All of these are treated as
/// transient by the pipeline: the affected unit is retried and then dropped,
/// never escalated to a job failure.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to launch extractor: {0}")]
    Spawn(String),

    #[error("extractor exited with {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("unparseable extractor output: {0}")]
    InvalidOutput(String),
}

/// Errors from the transcript source. The first two are definitive negative
/// outcomes recorded as terminal per-video statuses; the rest are recorded
/// as `error` and may be re-attempted on a later run.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("no transcript exists for this video")]
    NoTranscript,

    #[error("transcripts are disabled for this video")]
    TranscriptsDisabled,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Read-only view of a channel's listings plus search, used by discovery and
/// enrichment. All operations may fail transiently and are retryable.
pub trait VideoPlatform {
    /// The channel's curated playlists (title + playlist url per entry).
    fn channel_playlists(&self) -> Result<Vec<ListingEntry>, PlatformError>;

    /// Members of one playlist.
    fn playlist_entries(&self, url: &str) -> Result<Vec<ListingEntry>, PlatformError>;

    /// The channel's raw upload list.
    fn channel_uploads(&self) -> Result<Vec<ListingEntry>, PlatformError>;

    /// Free-text search, at most `limit` results.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<ListingEntry>, PlatformError>;

    /// Full metadata for one video.
    fn video_detail(&self, video_id: &str) -> Result<VideoDetail, PlatformError>;
}

/// Lists and fetches caption variants for a video.
pub trait TranscriptSource {
    fn list_variants(&self, video_id: &str) -> Result<Vec<TranscriptVariant>, TranscriptError>;

    fn fetch_segments(
        &self,
        variant: &TranscriptVariant,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}
