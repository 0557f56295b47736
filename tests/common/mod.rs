#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use assert_cmd::Command;
use rusqlite::Connection;
use tempfile::TempDir;

use solodex::api::{
    ListingEntry, PlatformError, TranscriptError, TranscriptSource, TranscriptVariant,
    VideoDetail, VideoPlatform,
};
use solodex::db::connection::open_db_at_path;
use solodex::models::{Candidate, SeriesType, SourceKind, TranscriptSegment};

/// A self-contained test environment with an isolated database file.
pub struct TestEnv {
    pub dir: TempDir,
    pub db_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("solodex.db");
        // Open once so the schema exists even for read-only tests.
        let conn = open_db_at_path(&db_path).unwrap();
        drop(conn);
        TestEnv { dir, db_path }
    }

    pub fn conn(&self) -> Connection {
        open_db_at_path(&self.db_path).unwrap()
    }

    /// Get a Command configured to run solodex against this environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = assert_cmd::cargo_bin_cmd!("solodex");
        cmd.arg("--db").arg(&self.db_path);
        cmd.env("NO_COLOR", "1");
        cmd
    }

    /// Get a Command with --json flag.
    pub fn cmd_json(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("--json");
        cmd
    }
}

/// A candidate with the fields most tests care about.
pub fn candidate(video_id: &str, season: u32, episode: Option<u32>, title: &str) -> Candidate {
    Candidate {
        video_id: video_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        url: format!("https://www.youtube.com/watch?v={}", video_id),
        channel_title: "촌장엔터테인먼트".into(),
        channel_id: "UCIfadKo7fcwSfgARMTz7xzA".into(),
        channel_url: "https://www.youtube.com/@chonjang".into(),
        duration_seconds: 4800,
        duration_text: "1:20:00".into(),
        upload_date: Some("2024-03-01".into()),
        published_ts: 1_709_251_200,
        view_count: 1000,
        like_count: 50,
        comment_count: 10,
        season: Some(season),
        episode,
        series_type: SeriesType::Main,
        source: SourceKind::OfficialPlaylist,
        is_official: true,
        source_priority: 3,
        dedupe_key: match episode {
            Some(e) => format!("s{:02}:e{:03}", season, e),
            None => format!("s{:02}:d2024-03-01:{}", season, video_id),
        },
    }
}

// ============================================================================
// Fake upstream clients
// ============================================================================

/// In-memory video platform. Every listing is addressable, and call counts
/// are recorded so tests can assert which strategies actually ran.
#[derive(Default)]
pub struct FakePlatform {
    pub playlists: Vec<ListingEntry>,
    pub playlist_items: HashMap<String, Vec<ListingEntry>>,
    pub uploads: Vec<ListingEntry>,
    pub search_results: HashMap<String, Vec<ListingEntry>>,
    pub details: HashMap<String, VideoDetail>,
    pub search_calls: RefCell<Vec<String>>,
    pub detail_calls: RefCell<Vec<String>>,
    /// video ids whose detail fetch always fails.
    pub broken_details: Vec<String>,
}

impl VideoPlatform for FakePlatform {
    fn channel_playlists(&self) -> Result<Vec<ListingEntry>, PlatformError> {
        Ok(self.playlists.clone())
    }

    fn playlist_entries(&self, url: &str) -> Result<Vec<ListingEntry>, PlatformError> {
        Ok(self.playlist_items.get(url).cloned().unwrap_or_default())
    }

    fn channel_uploads(&self) -> Result<Vec<ListingEntry>, PlatformError> {
        Ok(self.uploads.clone())
    }

    fn search(&self, query: &str, _limit: usize) -> Result<Vec<ListingEntry>, PlatformError> {
        self.search_calls.borrow_mut().push(query.to_string());
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }

    fn video_detail(&self, video_id: &str) -> Result<VideoDetail, PlatformError> {
        self.detail_calls.borrow_mut().push(video_id.to_string());
        if self.broken_details.iter().any(|id| id == video_id) {
            return Err(PlatformError::CommandFailed {
                status: 1,
                stderr: "simulated extraction failure".into(),
            });
        }
        self.details
            .get(video_id)
            .cloned()
            .ok_or_else(|| PlatformError::InvalidOutput(format!("no detail for {}", video_id)))
    }
}

pub fn listing_entry(id: &str, title: &str, description: &str) -> ListingEntry {
    ListingEntry {
        id: Some(id.to_string()),
        url: Some(format!("https://www.youtube.com/watch?v={}", id)),
        title: title.to_string(),
        description: description.to_string(),
    }
}

pub fn official_detail(video_id: &str, title: &str, views: u64) -> VideoDetail {
    VideoDetail {
        video_id: video_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        duration_seconds: 4800,
        duration_text: "1:20:00".into(),
        upload_date: Some("20240301".into()),
        published_ts: 1_709_251_200,
        view_count: views,
        like_count: views / 20,
        comment_count: views / 100,
        channel_title: "촌장엔터테인먼트".into(),
        channel_id: "UCIfadKo7fcwSfgARMTz7xzA".into(),
        channel_url: "https://www.youtube.com/@chonjang".into(),
    }
}

pub fn search_detail(video_id: &str, title: &str, views: u64) -> VideoDetail {
    VideoDetail {
        channel_title: "팬채널".into(),
        channel_id: "UCsomeoneelse".into(),
        channel_url: "https://www.youtube.com/@fanclips".into(),
        ..official_detail(video_id, title, views)
    }
}

/// In-memory transcript source. Variants are keyed by video id, segments by
/// the variant's base_url; a hook fires before each fetch so tests can
/// inject faults mid-run.
#[derive(Default)]
pub struct FakeTranscripts {
    pub variants: HashMap<String, Vec<TranscriptVariant>>,
    pub segments: HashMap<String, Vec<TranscriptSegment>>,
    /// video ids that report transcripts disabled.
    pub disabled: Vec<String>,
    pub list_calls: RefCell<Vec<String>>,
    pub fetch_calls: RefCell<usize>,
    pub before_fetch: Option<Box<dyn Fn(usize)>>,
}

impl TranscriptSource for FakeTranscripts {
    fn list_variants(&self, video_id: &str) -> Result<Vec<TranscriptVariant>, TranscriptError> {
        self.list_calls.borrow_mut().push(video_id.to_string());
        if self.disabled.iter().any(|id| id == video_id) {
            return Err(TranscriptError::TranscriptsDisabled);
        }
        match self.variants.get(video_id) {
            Some(variants) => Ok(variants.clone()),
            None => Err(TranscriptError::NoTranscript),
        }
    }

    fn fetch_segments(
        &self,
        variant: &TranscriptVariant,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let call = {
            let mut calls = self.fetch_calls.borrow_mut();
            *calls += 1;
            *calls
        };
        if let Some(hook) = &self.before_fetch {
            hook(call);
        }
        Ok(self.segments.get(&variant.base_url).cloned().unwrap_or_default())
    }
}

pub fn manual_ko_variant(video_id: &str) -> TranscriptVariant {
    TranscriptVariant {
        language_code: "ko".into(),
        is_generated: false,
        name: "한국어".into(),
        base_url: format!("tt://{}/ko-manual", video_id),
    }
}

pub fn segments_for(variant: &TranscriptVariant, lines: &[&str]) -> (String, Vec<TranscriptSegment>) {
    let segments = lines
        .iter()
        .enumerate()
        .map(|(i, line)| TranscriptSegment {
            start: i as f64 * 2.0,
            duration: 2.0,
            text: line.to_string(),
        })
        .collect();
    (variant.base_url.clone(), segments)
}
