//! Candidate discovery strategies.
//!
//! The authoritative strategy walks the official channel's curated playlists
//! and its raw upload list; the fallback strategy runs one general search
//! per season that the authoritative pass left empty. Both return unordered
//! seeds; reconciliation decides what survives.

use std::collections::HashMap;

use log::{debug, warn};

use super::config::CollectorConfig;
use super::{pause_ms, LogSink, Seed, OFFICIAL_PRIORITY, SEARCH_PRIORITY};
use crate::api::{ListingEntry, VideoPlatform};
use crate::models::SourceKind;
use crate::parse::{is_pure_main_content, parse_episode_number, parse_first_season};

const RELEVANCE_KEYWORDS: &[&str] = &["나는 solo", "나는솔로", "나솔"];

/// Seeds from the official channel: playlist members for every playlist
/// whose title names a requested season, plus uploads whose own text carries
/// a season marker and look like actual episodes.
pub fn discover_official(
    platform: &dyn VideoPlatform,
    config: &CollectorConfig,
    seasons: &[u32],
    log: &mut dyn LogSink,
) -> Vec<Seed> {
    let mut seeds: HashMap<String, Seed> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    let playlists = match platform.channel_playlists() {
        Ok(playlists) => playlists,
        Err(e) => {
            warn!("channel playlist listing failed: {}", e);
            log.log("WARN", &format!("Channel playlist listing failed: {}", e));
            Vec::new()
        }
    };

    let mut matched_playlists = 0usize;
    for playlist in &playlists {
        let playlist_title = playlist.title.trim();
        let Some(season) = parse_first_season(playlist_title) else {
            continue;
        };
        if !seasons.contains(&season) {
            continue;
        }
        matched_playlists += 1;
        let Some(url) = playlist.url.as_deref() else {
            continue;
        };

        let entries = match platform.playlist_entries(url) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("playlist {} listing failed: {}", url, e);
                log.log("WARN", &format!("Playlist listing failed for season {}: {}", season, e));
                continue;
            }
        };

        for entry in &entries {
            if let Some(seed) = seed_from_entry(
                entry,
                SourceKind::OfficialPlaylist,
                Some(season),
                true,
            ) {
                if !seeds.contains_key(&seed.video_id) {
                    order.push(seed.video_id.clone());
                }
                seeds.insert(seed.video_id.clone(), seed);
            }
        }

        log.log(
            "INFO",
            &format!("Season {} playlist scanned: {} entries", season, entries.len()),
        );
        pause_ms(config.request_delay_ms);
    }

    if matched_playlists == 0 {
        log.log(
            "INFO",
            "No curated playlist matched the requested seasons; relying on the channel upload list",
        );
    }

    let uploads = match platform.channel_uploads() {
        Ok(uploads) => uploads,
        Err(e) => {
            warn!("channel upload listing failed: {}", e);
            log.log("WARN", &format!("Channel upload listing failed: {}", e));
            Vec::new()
        }
    };

    let mut matched_from_channel = 0usize;
    for entry in &uploads {
        let combined = format!("{} {}", entry.title, entry.description);
        let Some(season) = parse_first_season(&combined) else {
            continue;
        };
        if !seasons.contains(&season) {
            continue;
        }
        if !is_pure_main_content(&entry.title, &entry.description) {
            debug!("skipping non-episode upload: {}", entry.title);
            continue;
        }
        let Some(seed) = seed_from_entry(
            entry,
            SourceKind::OfficialChannel,
            Some(season),
            true,
        ) else {
            continue;
        };
        if !seeds.contains_key(&seed.video_id) {
            order.push(seed.video_id.clone());
            matched_from_channel += 1;
        }
        // Playlist membership knows the season more reliably than free text,
        // so playlist seeds are not replaced by upload-list duplicates.
        seeds.entry(seed.video_id.clone()).or_insert(seed);
    }

    log.log(
        "INFO",
        &format!(
            "Official discovery done: {} matching playlists, {} extra uploads",
            matched_playlists, matched_from_channel
        ),
    );

    order.into_iter().filter_map(|id| seeds.remove(&id)).collect()
}

/// Seeds from one general search per season without authoritative coverage.
/// Results are gated on the season marker and a core series keyword to keep
/// cross-season and unrelated hits out.
pub fn discover_fallback(
    platform: &dyn VideoPlatform,
    config: &CollectorConfig,
    seasons: &[u32],
    log: &mut dyn LogSink,
) -> Vec<Seed> {
    let mut seeds: HashMap<String, Seed> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for &season in seasons {
        let query = format!("나는솔로 {}기", season);
        let entries = match platform.search(&query, config.max_search_results) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("search '{}' failed: {}", query, e);
                log.log("WARN", &format!("Search failed for season {}: {}", season, e));
                continue;
            }
        };

        let mut accepted = 0usize;
        for entry in &entries {
            let Some(seed) = seed_from_entry(entry, SourceKind::GeneralSearch, None, false) else {
                continue;
            };
            if seed.season != Some(season) {
                continue;
            }
            if !is_relevant(&seed.title, &seed.description, season) {
                continue;
            }
            if !seeds.contains_key(&seed.video_id) {
                order.push(seed.video_id.clone());
                accepted += 1;
            }
            seeds.insert(seed.video_id.clone(), seed);
        }

        log.log(
            "INFO",
            &format!("Season {} fallback search accepted {} candidates", season, accepted),
        );
        pause_ms(config.request_delay_ms);
    }

    order.into_iter().filter_map(|id| seeds.remove(&id)).collect()
}

/// Build a seed from one listing entry, or None when no video id can be
/// derived.
fn seed_from_entry(
    entry: &ListingEntry,
    source: SourceKind,
    forced_season: Option<u32>,
    is_official: bool,
) -> Option<Seed> {
    let raw_url = entry.url.clone().unwrap_or_default();
    let video_id = entry
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| video_id_from_url(&raw_url))?;

    let title = entry.title.trim().to_string();
    let description = super::truncate_chars(entry.description.trim(), 1200);
    let season =
        forced_season.or_else(|| parse_first_season(&format!("{} {}", title, description)));
    let episode = parse_episode_number(&title);

    let url = if raw_url.starts_with("http") {
        raw_url
    } else {
        format!("https://www.youtube.com/watch?v={}", video_id)
    };

    Some(Seed {
        video_id,
        title,
        description,
        url,
        season,
        episode,
        source,
        is_official,
        source_priority: if is_official {
            OFFICIAL_PRIORITY
        } else {
            SEARCH_PRIORITY
        },
    })
}

/// Pull a video id out of a watch or short URL.
fn video_id_from_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }

    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let (host, rest) = match without_scheme.split_once('/') {
        Some((host, rest)) => (host, rest),
        None => (without_scheme, ""),
    };

    if host.ends_with("youtu.be") {
        let id = rest.split(['?', '&', '/']).next().unwrap_or("");
        return if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        };
    }

    let query = rest.split_once('?').map(|(_, q)| q).unwrap_or("");
    for pair in query.split('&') {
        if let Some(id) = pair.strip_prefix("v=") {
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }
    None
}

/// Fallback search gate: the season's own marker plus a core series keyword
/// must both appear.
fn is_relevant(title: &str, description: &str, season: u32) -> bool {
    let combined = format!("{} {}", title, description).to_lowercase();
    if !combined.contains(&format!("{}기", season)) {
        return false;
    }
    RELEVANCE_KEYWORDS.iter().any(|k| combined.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, title: &str, description: &str) -> ListingEntry {
        ListingEntry {
            id: Some(id.to_string()),
            url: Some(format!("https://www.youtube.com/watch?v={}", id)),
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn seed_uses_forced_season_over_text() {
        let seed = seed_from_entry(
            &entry("abc123def45", "나는솔로 10기 1화", ""),
            SourceKind::OfficialPlaylist,
            Some(11),
            true,
        )
        .unwrap();
        assert_eq!(seed.season, Some(11));
        assert_eq!(seed.episode, Some(1));
        assert_eq!(seed.source_priority, OFFICIAL_PRIORITY);
        assert!(seed.is_official);
    }

    #[test]
    fn seed_parses_season_from_text_when_not_forced() {
        let seed = seed_from_entry(
            &entry("abc123def45", "나는솔로 12기 예고", ""),
            SourceKind::GeneralSearch,
            None,
            false,
        )
        .unwrap();
        assert_eq!(seed.season, Some(12));
        assert_eq!(seed.source_priority, SEARCH_PRIORITY);
    }

    #[test]
    fn seed_requires_a_video_id() {
        let no_id = ListingEntry {
            id: None,
            url: Some("https://www.youtube.com/playlist?list=PL123".to_string()),
            title: "목록".to_string(),
            description: String::new(),
        };
        assert!(seed_from_entry(&no_id, SourceKind::GeneralSearch, None, false).is_none());
    }

    #[test]
    fn seed_falls_back_to_url_id() {
        let from_url = ListingEntry {
            id: None,
            url: Some("https://youtu.be/xyz987".to_string()),
            title: "나는솔로 11기".to_string(),
            description: String::new(),
        };
        let seed = seed_from_entry(&from_url, SourceKind::GeneralSearch, None, false).unwrap();
        assert_eq!(seed.video_id, "xyz987");
    }

    #[test]
    fn video_id_from_url_variants() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?t=10&v=abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            video_id_from_url("https://youtu.be/abc123?t=10"),
            Some("abc123".to_string())
        );
        assert_eq!(video_id_from_url("https://example.com/page"), None);
        assert_eq!(video_id_from_url(""), None);
    }

    #[test]
    fn relevance_gate_needs_marker_and_keyword() {
        assert!(is_relevant("나는솔로 11기 정주행", "", 11));
        assert!(is_relevant("레전드 모음", "나솔 11기 다시보기", 11));
        // Season marker without a series keyword is not enough.
        assert!(!is_relevant("고양이 브이로그 11기", "", 11));
        // Right keyword, wrong season.
        assert!(!is_relevant("나는솔로 10기 모음", "", 11));
    }
}
