//! Title and description parsing for 나는 SOLO episodes.
//!
//! Everything in here is a pure function over free text: season markers
//! (`12기`), episode markers (`EP 5`, `3화`), series classification, the
//! dedupe key used to collapse duplicate discoveries, and the normalized
//! content hash used to detect transcript drift between fetches.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use sha2::{Digest, Sha256};

pub const MIN_SEASON: u32 = 1;
pub const MAX_SEASON: u32 = 29;

/// A season marker is a 1-2 digit number directly before `기`. The leading
/// group keeps `2023기수` from matching on the trailing digits of a year.
static SEASON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])([12]?[0-9])\s*기").unwrap());

/// Episode patterns in precedence order; the first pattern that matches wins,
/// later patterns are not consulted.
static EPISODE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bEP\s*\.?\s*([0-9]{1,3})\b").unwrap(),
        Regex::new(r"(?i)\bE\s*\.?\s*([0-9]{1,3})\b").unwrap(),
        Regex::new(r"([0-9]{1,3})\s*[화회]").unwrap(),
    ]
});

static BRACKETED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]|\([^)]*\)").unwrap());

const SPINOFF_KEYWORDS: &[&str] = &["나솔사계", "사랑은 계속된다", "지볶행", "솔로민박"];
const MAIN_KEYWORDS: &[&str] = &["나는 solo", "나는솔로", "솔로나라"];

/// Markers for uploads on the official channel that are not broadcast
/// episodes: live segments, behind-the-scenes clips, news, interviews.
const NON_EPISODE_KEYWORDS: &[&str] = &[
    "라이브",
    "live",
    "비하인드",
    "behind",
    "뉴스",
    "인터뷰",
    "interview",
];

/// Which branch of the series a video belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    Main,
    Spinoff,
    Unknown,
}

impl SeriesType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesType::Main => "main",
            SeriesType::Spinoff => "spinoff",
            SeriesType::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "main" => SeriesType::Main,
            "spinoff" => SeriesType::Spinoff,
            _ => SeriesType::Unknown,
        }
    }
}

pub fn clean_spaces(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All distinct in-range season numbers, in order of first occurrence.
pub fn parse_season_numbers(text: &str) -> Vec<u32> {
    let mut seasons = Vec::new();
    for cap in SEASON_RE.captures_iter(text) {
        let Ok(season) = cap[1].parse::<u32>() else {
            continue;
        };
        if (MIN_SEASON..=MAX_SEASON).contains(&season) && !seasons.contains(&season) {
            seasons.push(season);
        }
    }
    seasons
}

/// The first valid season marker in the text, if any.
pub fn parse_first_season(text: &str) -> Option<u32> {
    parse_season_numbers(text).into_iter().next()
}

/// Episode (broadcast round) number from a title. Patterns are tried in a
/// fixed priority order; a match outside 1..=999 falls through to the next
/// pattern.
pub fn parse_episode_number(text: &str) -> Option<u32> {
    for re in EPISODE_RES.iter() {
        let Some(cap) = re.captures(text) else {
            continue;
        };
        if let Ok(episode) = cap[1].parse::<u32>() {
            if (1..=999).contains(&episode) {
                return Some(episode);
            }
        }
    }
    None
}

/// Classify a video by its title and description. Spin-off keywords win over
/// main-series keywords when both appear.
pub fn classify_series_type(title: &str, description: &str) -> SeriesType {
    let combined = format!("{} {}", title, description).to_lowercase();
    if SPINOFF_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return SeriesType::Spinoff;
    }
    if MAIN_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return SeriesType::Main;
    }
    SeriesType::Unknown
}

/// True only for uploads that look like actual broadcast episodes of the
/// main series: a main-series keyword present and none of the non-episode
/// markers (live, behind-the-scenes, news, interview).
pub fn is_pure_main_content(title: &str, description: &str) -> bool {
    let combined = format!("{} {}", title, description).to_lowercase();
    if !MAIN_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return false;
    }
    !NON_EPISODE_KEYWORDS.iter().any(|k| combined.contains(k))
}

/// Strip bracketed spans and everything outside Hangul/alphanumerics, then
/// collapse whitespace and lowercase. Used for the fallback dedupe key.
pub fn normalize_title_for_key(title: &str) -> String {
    let cleaned = BRACKETED_RE.replace_all(title, " ");
    let cleaned: String = cleaned
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || ('가'..='힣').contains(&c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    clean_spaces(&cleaned).to_lowercase()
}

/// Grouping key for duplicate discoveries of the same episode.
///
/// With a known episode the key is exact (`s11:e005`). Without one it falls
/// back to season + upload date + a truncated normalized title, which is a
/// heuristic: two genuinely distinct episodes with near-identical titles and
/// no episode marker can collide.
pub fn make_dedupe_key(
    season: Option<u32>,
    episode: Option<u32>,
    upload_date: Option<&str>,
    title: &str,
) -> String {
    let season_part = season.unwrap_or(0);
    if let Some(episode) = episode {
        return format!("s{:02}:e{:03}", season_part, episode);
    }

    let day = upload_date.unwrap_or("0000-00-00");
    let norm = normalize_title_for_key(title);
    let prefix: String = norm.chars().take(48).collect();
    let prefix = if prefix.is_empty() {
        "untitled".to_string()
    } else {
        prefix
    };
    format!("s{:02}:d{}:{}", season_part, day, prefix)
}

/// Lowercase, collapse whitespace, and drop everything outside Hangul,
/// alphanumerics and spaces. Keeps the hash stable across caption re-renders
/// that only shuffle punctuation or spacing.
pub fn normalize_text_for_hash(text: &str) -> String {
    let lowered = text.to_lowercase();
    let filtered: String = lowered
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || ('가'..='힣').contains(c) || c.is_whitespace())
        .collect();
    clean_spaces(&filtered)
}

/// SHA-256 over the normalized transcript text, hex-encoded.
pub fn transcript_hash(text: &str) -> String {
    let normalized = normalize_text_for_hash(text);
    let digest = Sha256::digest(normalized.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse the upload-date spellings the platform emits into ISO `YYYY-MM-DD`.
pub fn parse_upload_date(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for pattern in ["%Y%m%d", "%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, pattern) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

/// Sort, dedup and clamp a season selection to the valid range.
pub fn normalize_seasons(values: &[u32]) -> Vec<u32> {
    let mut seasons: Vec<u32> = values
        .iter()
        .copied()
        .filter(|s| (MIN_SEASON..=MAX_SEASON).contains(s))
        .collect();
    seasons.sort_unstable();
    seasons.dedup();
    seasons
}
