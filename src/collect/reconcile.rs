//! Reconciliation: merge discovery output, enrich it with full metadata,
//! collapse duplicates, and fix the persistence order.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::config::CollectorConfig;
use super::{pause_ms, truncate_chars, LogSink, Seed, OFFICIAL_PRIORITY};
use crate::api::VideoPlatform;
use crate::models::{Candidate, SourceKind};
use crate::parse::{
    classify_series_type, make_dedupe_key, parse_episode_number, parse_first_season,
    parse_upload_date,
};

const MAX_DESCRIPTION_CHARS: usize = 4000;

/// Union of both strategies keyed by video id; when both found the same
/// video, the authoritative entry wins outright.
pub fn merge_seeds(official: Vec<Seed>, fallback: Vec<Seed>) -> Vec<Seed> {
    let official_ids: HashSet<String> =
        official.iter().map(|s| s.video_id.clone()).collect();

    let mut merged = official;
    merged.extend(
        fallback
            .into_iter()
            .filter(|s| !official_ids.contains(&s.video_id)),
    );
    merged
}

/// Fetch full metadata for every seed and turn it into a candidate.
///
/// Enrichment failures are retried under the backoff policy and then the
/// seed is dropped; a missing candidate beats a corrupt one. Candidates
/// whose enriched season falls outside the requested set are dropped too,
/// which throws out mis-classified search hits.
pub fn enrich(
    platform: &dyn VideoPlatform,
    config: &CollectorConfig,
    seeds: Vec<Seed>,
    target_seasons: &[u32],
    log: &mut dyn LogSink,
) -> Vec<Candidate> {
    let total = seeds.len();
    let mut enriched = Vec::with_capacity(total);

    for (idx, seed) in seeds.into_iter().enumerate() {
        let detail = match config
            .enrich_backoff
            .run(|| platform.video_detail(&seed.video_id))
        {
            Ok(detail) => detail,
            Err(e) => {
                debug!("dropping {} after failed enrichment: {}", seed.video_id, e);
                continue;
            }
        };

        let title = if detail.title.trim().is_empty() {
            seed.title.clone()
        } else {
            detail.title.trim().to_string()
        };
        let description = if detail.description.trim().is_empty() {
            seed.description.clone()
        } else {
            truncate_chars(detail.description.trim(), MAX_DESCRIPTION_CHARS)
        };

        let season = seed
            .season
            .or_else(|| parse_first_season(&format!("{} {}", title, description)));
        let Some(season_value) = season else {
            continue;
        };
        if !target_seasons.contains(&season_value) {
            continue;
        }

        let upload_date = detail
            .upload_date
            .as_deref()
            .and_then(parse_upload_date);
        let episode = seed.episode.or_else(|| parse_episode_number(&title));

        // The enriched channel identity can reveal an official upload that a
        // search strategy found first; promote it to official priority.
        let is_official = seed.is_official
            || detail.channel_id == config.channel_id
            || detail
                .channel_url
                .to_lowercase()
                .contains(&config.channel_handle.to_lowercase());
        let source = if is_official && seed.source == SourceKind::GeneralSearch {
            SourceKind::OfficialChannel
        } else {
            seed.source
        };

        let dedupe_key = make_dedupe_key(Some(season_value), episode, upload_date.as_deref(), &title);
        let series_type = classify_series_type(&title, &description);
        let url = format!("https://www.youtube.com/watch?v={}", seed.video_id);

        enriched.push(Candidate {
            video_id: seed.video_id,
            title,
            description,
            url,
            channel_title: detail.channel_title,
            channel_id: detail.channel_id,
            channel_url: detail.channel_url,
            duration_seconds: detail.duration_seconds,
            duration_text: detail.duration_text,
            upload_date,
            published_ts: detail.published_ts,
            view_count: detail.view_count,
            like_count: detail.like_count,
            comment_count: detail.comment_count,
            season: Some(season_value),
            episode,
            series_type,
            source,
            is_official,
            source_priority: if is_official {
                OFFICIAL_PRIORITY
            } else {
                seed.source_priority
            },
            dedupe_key,
        });

        if (idx + 1) % 10 == 0 {
            log.log("INFO", &format!("Metadata enrichment {}/{}", idx + 1, total));
        }
        pause_ms(config.request_delay_ms);
    }

    enriched
}

/// Collapse candidates sharing a dedupe key down to one winner each.
pub fn dedupe(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut by_key: HashMap<String, Candidate> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for candidate in candidates {
        let keep = match by_key.get(&candidate.dedupe_key) {
            None => {
                order.push(candidate.dedupe_key.clone());
                true
            }
            Some(current) => is_higher_priority(&candidate, current),
        };
        if keep {
            by_key.insert(candidate.dedupe_key.clone(), candidate);
        }
    }

    order.into_iter().filter_map(|key| by_key.remove(&key)).collect()
}

/// Total order deciding which duplicate survives: officialness, then source
/// priority, then views, then comments, then upload date, all descending.
fn is_higher_priority(incoming: &Candidate, existing: &Candidate) -> bool {
    let key = |c: &Candidate| {
        (
            c.is_official,
            c.source_priority,
            c.view_count,
            c.comment_count,
            c.upload_date.clone().unwrap_or_default(),
        )
    };
    key(incoming) > key(existing)
}

/// Deterministic persistence order: season, then episode with unknown last,
/// then upload date, then video id.
pub fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}

fn sort_key(c: &Candidate) -> (u32, u32, String, String) {
    (
        c.season.unwrap_or(999),
        c.episode.unwrap_or(9999),
        c.upload_date.clone().unwrap_or_else(|| "9999-99-99".to_string()),
        c.video_id.clone(),
    )
}
