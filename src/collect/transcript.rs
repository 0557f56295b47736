//! Transcript retrieval for one video.
//!
//! Terminal states are `success`, `no_transcript`, `transcripts_disabled`
//! and `error`; only `error` is worth re-attempting on a later run. The
//! variant selection order is: human-authored Korean, auto-generated
//! Korean, any configured language, then whatever exists.

use log::debug;

use super::config::CollectorConfig;
use super::truncate_chars;
use crate::api::{TranscriptError, TranscriptSource, TranscriptVariant};
use crate::models::{TranscriptResult, TranscriptStatus};
use crate::parse::transcript_hash;

const PRIMARY_LANGUAGES: &[&str] = &["ko", "ko-KR"];
const MAX_ERROR_CHARS: usize = 180;

/// Apply the selection policy to the available variants. Returns the chosen
/// variant and its kind label ("manual"/"auto").
pub fn select_variant<'a>(
    variants: &'a [TranscriptVariant],
    preferred_languages: &[String],
) -> Option<(&'a TranscriptVariant, &'static str)> {
    let primary =
        |v: &TranscriptVariant| PRIMARY_LANGUAGES.contains(&v.language_code.as_str());
    let kind_of = |v: &TranscriptVariant| if v.is_generated { "auto" } else { "manual" };

    if let Some(v) = variants.iter().find(|v| primary(v) && !v.is_generated) {
        return Some((v, "manual"));
    }
    if let Some(v) = variants.iter().find(|v| primary(v)) {
        return Some((v, "auto"));
    }
    for lang in preferred_languages {
        if let Some(v) = variants.iter().find(|v| &v.language_code == lang) {
            return Some((v, kind_of(v)));
        }
    }
    variants.first().map(|v| (v, kind_of(v)))
}

/// Fetch one video's transcript and fold the outcome into a result record.
/// Upstream failures never escape: every path maps to a stored status.
pub fn fetch_transcript(
    source: &dyn TranscriptSource,
    config: &CollectorConfig,
    video_id: &str,
) -> TranscriptResult {
    let variants = match source.list_variants(video_id) {
        Ok(variants) => variants,
        Err(TranscriptError::NoTranscript) => {
            return TranscriptResult::failure(TranscriptStatus::NoTranscript);
        }
        Err(TranscriptError::TranscriptsDisabled) => {
            return TranscriptResult::failure(TranscriptStatus::TranscriptsDisabled);
        }
        Err(e) => return error_result(video_id, e),
    };

    let Some((variant, kind)) = select_variant(&variants, &config.preferred_languages) else {
        return TranscriptResult::failure(TranscriptStatus::NoTranscript);
    };

    let segments = match source.fetch_segments(variant) {
        Ok(segments) => segments,
        Err(TranscriptError::NoTranscript) => {
            return TranscriptResult::failure(TranscriptStatus::NoTranscript);
        }
        Err(TranscriptError::TranscriptsDisabled) => {
            return TranscriptResult::failure(TranscriptStatus::TranscriptsDisabled);
        }
        Err(e) => return error_result(video_id, e),
    };

    // Blank caption lines carry no content and would bloat the joined text.
    let segments: Vec<_> = segments
        .into_iter()
        .filter_map(|mut segment| {
            segment.text = segment.text.trim().to_string();
            if segment.text.is_empty() {
                None
            } else {
                Some(segment)
            }
        })
        .collect();

    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    TranscriptResult {
        status: TranscriptStatus::Success,
        language: variant.language_code.clone(),
        kind: kind.to_string(),
        content_hash: transcript_hash(&text),
        text,
        segments,
        error_message: String::new(),
    }
}

fn error_result(video_id: &str, err: TranscriptError) -> TranscriptResult {
    debug!("transcript fetch for {} failed: {}", video_id, err);
    let mut result = TranscriptResult::failure(TranscriptStatus::Error);
    result.error_message = truncate_chars(&err.to_string(), MAX_ERROR_CHARS);
    result
}
