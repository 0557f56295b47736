//! The collection pipeline: discovery, reconciliation, transcript retrieval
//! and the orchestrator that drives one job end-to-end.
//!
//! The pipeline is a single sequence of blocking network-bound steps. Every
//! network call is followed by a mandated delay; upstream rate limits make
//! anything more concurrent counterproductive.

pub mod collector;
pub mod config;
pub mod discovery;
pub mod reconcile;
pub mod retry;
pub mod transcript;

use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::models::SourceKind;

pub use collector::{CollectOptions, Collector};
pub use config::CollectorConfig;
pub use retry::BackoffPolicy;

/// Source priority carried by official-channel discoveries.
pub const OFFICIAL_PRIORITY: i64 = 3;
/// Source priority carried by general-search discoveries.
pub const SEARCH_PRIORITY: i64 = 1;

/// A raw candidate straight out of a discovery strategy, before enrichment.
#[derive(Debug, Clone)]
pub struct Seed {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub source: SourceKind,
    pub is_official: bool,
    pub source_priority: i64,
}

/// Ordered sink for job-scoped log lines. The orchestrator writes to it; how
/// lines reach a user (polling, streaming, stderr) is the caller's concern.
pub trait LogSink {
    fn log(&mut self, level: &str, message: &str);
}

/// Discards everything.
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&mut self, _level: &str, _message: &str) {}
}

/// Collects lines in memory; used by tests and by callers that buffer.
impl LogSink for Vec<(String, String)> {
    fn log(&mut self, level: &str, message: &str) {
        self.push((level.to_string(), message.to_string()));
    }
}

/// Fixed politeness delay after one network-bound unit of work.
pub(crate) fn pause_ms(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

/// Randomized delay drawn from an inclusive range, used after transcript
/// fetch attempts to smooth the request rate.
pub(crate) fn pause_range_ms(min_ms: u64, max_ms: u64) {
    if max_ms == 0 {
        return;
    }
    let (min_ms, max_ms) = if min_ms <= max_ms {
        (min_ms, max_ms)
    } else {
        (max_ms, min_ms)
    };
    let ms = rand::thread_rng().gen_range(min_ms..=max_ms);
    thread::sleep(Duration::from_millis(ms));
}

/// Truncate to a maximum number of characters, respecting char boundaries.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
