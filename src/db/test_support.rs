//! Shared fixtures for database unit tests.

use rusqlite::Connection;

use crate::models::{Candidate, SeriesType, SourceKind};

/// In-memory database with the full schema applied.
pub fn open_test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(include_str!("migrations/v001_initial_schema.sql"))
        .unwrap();
    conn.execute_batch(include_str!("migrations/v002_analysis_views.sql"))
        .unwrap();
    conn
}

/// A minimal general-search candidate; tests override what they care about.
pub fn sample_candidate(video_id: &str) -> Candidate {
    Candidate {
        video_id: video_id.to_string(),
        title: format!("나는솔로 영상 {}", video_id),
        description: String::new(),
        url: format!("https://www.youtube.com/watch?v={}", video_id),
        channel_title: "어느 채널".into(),
        channel_id: "UCother".into(),
        channel_url: "https://www.youtube.com/@other".into(),
        duration_seconds: 0,
        duration_text: String::new(),
        upload_date: None,
        published_ts: 0,
        view_count: 0,
        like_count: 0,
        comment_count: 0,
        season: Some(11),
        episode: None,
        series_type: SeriesType::Main,
        source: SourceKind::GeneralSearch,
        is_official: false,
        source_priority: 1,
        dedupe_key: format!("s11:d0000-00-00:{}", video_id),
    }
}
