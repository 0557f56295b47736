//! Video platform client backed by the `yt-dlp` extractor.
//!
//! Listings (playlists, channel uploads, search) use flat extraction so we
//! never touch individual watch pages during discovery; per-video detail is
//! a separate full extraction during enrichment. Every call is one
//! subprocess invocation with `--dump-single-json`.

use std::process::Command;

use log::debug;
use serde::Deserialize;

use super::types::{ListingEntry, PlatformError, VideoDetail, VideoPlatform};

const YT_DLP_BIN: &str = "yt-dlp";

/// `yt-dlp`-backed implementation of [`VideoPlatform`] for one channel.
pub struct YtDlpPlatform {
    channel_handle: String,
    program: String,
}

impl YtDlpPlatform {
    pub fn new(channel_handle: impl Into<String>) -> Self {
        YtDlpPlatform {
            channel_handle: channel_handle.into(),
            program: YT_DLP_BIN.to_string(),
        }
    }

    /// Use a different extractor binary (test stubs, vendored builds).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn run(&self, url: &str, flat: bool) -> Result<serde_json::Value, PlatformError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--ignore-errors");
        if flat {
            cmd.arg("--flat-playlist");
        }
        cmd.arg(url);

        debug!("{} {} (flat={})", self.program, url, flat);
        let output = cmd
            .output()
            .map_err(|e| PlatformError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let line = stderr.lines().last().unwrap_or("").to_string();
            debug!("  extractor failed: {}", line);
            return Err(PlatformError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: line,
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| PlatformError::InvalidOutput(e.to_string()))
    }

    fn listing(&self, url: &str) -> Result<Vec<ListingEntry>, PlatformError> {
        let info = self.run(url, true)?;

        // A playlist-like page carries "entries" (with nulls where extraction
        // of a member failed); a bare video resolves to a single object.
        let entries_value = info.get("entries").cloned();
        let entries: Vec<RawEntry> = match entries_value {
            Some(value) => {
                let entries: Vec<Option<RawEntry>> = serde_json::from_value(value)
                    .map_err(|e| PlatformError::InvalidOutput(e.to_string()))?;
                entries.into_iter().flatten().collect()
            }
            None => vec![
                serde_json::from_value(info)
                    .map_err(|e| PlatformError::InvalidOutput(e.to_string()))?,
            ],
        };

        Ok(entries
            .into_iter()
            .map(|e| ListingEntry {
                id: e.id,
                url: e.url.or(e.webpage_url),
                title: e.title.unwrap_or_default(),
                description: e.description.unwrap_or_default(),
            })
            .collect())
    }
}

impl VideoPlatform for YtDlpPlatform {
    fn channel_playlists(&self) -> Result<Vec<ListingEntry>, PlatformError> {
        let url = format!("https://www.youtube.com/{}/playlists", self.channel_handle);
        self.listing(&url)
    }

    fn playlist_entries(&self, url: &str) -> Result<Vec<ListingEntry>, PlatformError> {
        self.listing(url)
    }

    fn channel_uploads(&self) -> Result<Vec<ListingEntry>, PlatformError> {
        let url = format!("https://www.youtube.com/{}/videos", self.channel_handle);
        self.listing(&url)
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<ListingEntry>, PlatformError> {
        self.listing(&format!("ytsearch{}:{}", limit, query))
    }

    fn video_detail(&self, video_id: &str) -> Result<VideoDetail, PlatformError> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let info = self.run(&url, false)?;
        let raw: RawDetail = serde_json::from_value(info)
            .map_err(|e| PlatformError::InvalidOutput(e.to_string()))?;

        Ok(VideoDetail {
            video_id: raw.id.unwrap_or_else(|| video_id.to_string()),
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            duration_seconds: raw.duration.unwrap_or(0.0).max(0.0) as u64,
            duration_text: raw.duration_string.unwrap_or_default(),
            upload_date: raw.upload_date,
            published_ts: raw.timestamp.unwrap_or(0),
            view_count: raw.view_count.unwrap_or(0),
            like_count: raw.like_count.unwrap_or(0),
            comment_count: raw.comment_count.unwrap_or(0),
            channel_title: raw.channel.or(raw.uploader).unwrap_or_default(),
            channel_id: raw.channel_id.unwrap_or_default(),
            channel_url: raw.channel_url.unwrap_or_default(),
        })
    }
}

// ============================================================================
// Raw extractor output
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDetail {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    duration_string: Option<String>,
    #[serde(default)]
    upload_date: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    like_count: Option<u64>,
    #[serde(default)]
    comment_count: Option<u64>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    channel_url: Option<String>,
}
