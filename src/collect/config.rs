//! Collector configuration.
//!
//! Defaults target the official 나는 SOLO channel; a TOML file can override
//! any subset of fields for other deployments or for tests.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::retry::BackoffPolicy;

/// Tuning knobs for one collection run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Channel handle of the authoritative upload channel, with the `@`.
    pub channel_handle: String,
    /// Platform-assigned id of the authoritative channel.
    pub channel_id: String,
    /// Fixed delay after each listing/enrichment request.
    pub request_delay_ms: u64,
    /// Randomized delay range after each transcript fetch attempt.
    pub transcript_delay_min_ms: u64,
    pub transcript_delay_max_ms: u64,
    /// Upper bound on results per fallback search.
    pub max_search_results: usize,
    /// Retry policy for per-video metadata enrichment.
    pub enrich_backoff: BackoffPolicy,
    /// Acceptable transcript languages beyond the primary family, in order.
    pub preferred_languages: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            channel_handle: "@chonjang".to_string(),
            channel_id: "UCIfadKo7fcwSfgARMTz7xzA".to_string(),
            request_delay_ms: 1300,
            transcript_delay_min_ms: 2500,
            transcript_delay_max_ms: 5000,
            max_search_results: 50,
            enrich_backoff: BackoffPolicy::default(),
            preferred_languages: vec![
                "ko".to_string(),
                "ko-KR".to_string(),
                "en".to_string(),
                "en-US".to_string(),
            ],
        }
    }
}

impl CollectorConfig {
    /// Load from a TOML file, overlaying the defaults with whatever fields
    /// the file sets.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let overlay: ConfigOverlay = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(overlay.apply(CollectorConfig::default()))
    }

    /// A configuration with all delays zeroed, for tests.
    pub fn instant() -> Self {
        CollectorConfig {
            request_delay_ms: 0,
            transcript_delay_min_ms: 0,
            transcript_delay_max_ms: 0,
            enrich_backoff: BackoffPolicy {
                base_delay_ms: 0,
                max_jitter_ms: 0,
                ..BackoffPolicy::default()
            },
            ..CollectorConfig::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverlay {
    channel_handle: Option<String>,
    channel_id: Option<String>,
    request_delay_ms: Option<u64>,
    transcript_delay_min_ms: Option<u64>,
    transcript_delay_max_ms: Option<u64>,
    max_search_results: Option<usize>,
    max_enrich_attempts: Option<u32>,
    preferred_languages: Option<Vec<String>>,
}

impl ConfigOverlay {
    fn apply(self, mut config: CollectorConfig) -> CollectorConfig {
        if let Some(v) = self.channel_handle {
            config.channel_handle = v;
        }
        if let Some(v) = self.channel_id {
            config.channel_id = v;
        }
        if let Some(v) = self.request_delay_ms {
            config.request_delay_ms = v;
        }
        if let Some(v) = self.transcript_delay_min_ms {
            config.transcript_delay_min_ms = v;
        }
        if let Some(v) = self.transcript_delay_max_ms {
            config.transcript_delay_max_ms = v;
        }
        if let Some(v) = self.max_search_results {
            config.max_search_results = v;
        }
        if let Some(v) = self.max_enrich_attempts {
            config.enrich_backoff.max_attempts = v;
        }
        if let Some(v) = self.preferred_languages {
            config.preferred_languages = v;
        }
        config
    }
}
