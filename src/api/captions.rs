//! Transcript source client backed by the platform's player endpoint.
//!
//! Listing variants means asking the innertube `player` endpoint for the
//! caption track list; fetching a variant means requesting its timedtext URL
//! in `json3` format and flattening the events into timed segments.

use std::time::{Duration, Instant};

use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::types::{TranscriptError, TranscriptSource, TranscriptVariant};
use crate::models::TranscriptSegment;

const PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const CLIENT_NAME: &str = "ANDROID";
const CLIENT_VERSION: &str = "20.10.38";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Innertube-backed implementation of [`TranscriptSource`].
pub struct InnertubeTranscripts {
    client: reqwest::blocking::Client,
}

impl InnertubeTranscripts {
    pub fn new() -> Result<Self, TranscriptError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| TranscriptError::Network(e.to_string()))?;
        Ok(InnertubeTranscripts { client })
    }
}

impl TranscriptSource for InnertubeTranscripts {
    fn list_variants(&self, video_id: &str) -> Result<Vec<TranscriptVariant>, TranscriptError> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        debug!("POST {} (video_id={})", PLAYER_URL, video_id);
        let start = Instant::now();
        let response = self
            .client
            .post(PLAYER_URL)
            .json(&body)
            .send()
            .map_err(|e| {
                debug!("  network error after {:?}: {}", start.elapsed(), e);
                TranscriptError::Network(e.to_string())
            })?;

        let status = response.status();
        debug!("  response: {} in {:?}", status, start.elapsed());
        if !status.is_success() {
            return Err(TranscriptError::Network(format!(
                "player endpoint returned {}",
                status
            )));
        }

        let player: PlayerResponse = response
            .json()
            .map_err(|e| TranscriptError::InvalidResponse(e.to_string()))?;

        if let Some(playability) = &player.playability_status {
            let state = playability.status.as_deref().unwrap_or("OK");
            if state != "OK" {
                let reason = playability.reason.clone().unwrap_or_else(|| state.to_string());
                debug!("  unplayable: {}", reason);
                return Err(TranscriptError::InvalidResponse(reason));
            }
        }

        // A playable video without a captions block has captions turned off;
        // a present but empty track list means nothing was ever captioned.
        let Some(captions) = player.captions else {
            return Err(TranscriptError::TranscriptsDisabled);
        };
        let tracks = captions
            .player_captions_tracklist_renderer
            .map(|r| r.caption_tracks)
            .unwrap_or_default();
        if tracks.is_empty() {
            return Err(TranscriptError::NoTranscript);
        }

        debug!("  {} caption tracks", tracks.len());
        Ok(tracks
            .into_iter()
            .filter_map(|track| {
                let base_url = track.base_url?;
                Some(TranscriptVariant {
                    language_code: track.language_code.unwrap_or_default(),
                    is_generated: track.kind.as_deref() == Some("asr"),
                    name: track
                        .name
                        .map(|n| n.display_text())
                        .unwrap_or_default(),
                    base_url,
                })
            })
            .collect())
    }

    fn fetch_segments(
        &self,
        variant: &TranscriptVariant,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let url = format!("{}&fmt=json3", variant.base_url);
        debug!("GET timedtext ({})", variant.language_code);

        let start = Instant::now();
        let response = self.client.get(&url).send().map_err(|e| {
            debug!("  network error after {:?}: {}", start.elapsed(), e);
            TranscriptError::Network(e.to_string())
        })?;

        let status = response.status();
        debug!("  response: {} in {:?}", status, start.elapsed());
        if !status.is_success() {
            return Err(TranscriptError::Network(format!(
                "timedtext returned {}",
                status
            )));
        }

        let timedtext: TimedText = response
            .json()
            .map_err(|e| TranscriptError::InvalidResponse(e.to_string()))?;

        Ok(flatten_events(timedtext))
    }
}

fn flatten_events(timedtext: TimedText) -> Vec<TranscriptSegment> {
    timedtext
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event
                .segs
                .unwrap_or_default()
                .into_iter()
                .filter_map(|seg| seg.utf8)
                .collect();
            let text = text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment {
                start: event.t_start_ms.unwrap_or(0) as f64 / 1000.0,
                duration: event.d_duration_ms.unwrap_or(0) as f64 / 1000.0,
                text,
            })
        })
        .collect()
}

// ============================================================================
// Raw player / timedtext payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    #[serde(rename = "playabilityStatus", default)]
    playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer", default)]
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct TracklistRenderer {
    #[serde(rename = "captionTracks", default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl", default)]
    base_url: Option<String>,
    #[serde(rename = "languageCode", default)]
    language_code: Option<String>,
    /// "asr" marks an auto-generated track.
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<TrackName>,
}

#[derive(Debug, Deserialize)]
struct TrackName {
    #[serde(rename = "simpleText", default)]
    simple_text: Option<String>,
    #[serde(default)]
    runs: Option<Vec<TextRun>>,
}

impl TrackName {
    fn display_text(self) -> String {
        if let Some(text) = self.simple_text {
            return text;
        }
        self.runs
            .unwrap_or_default()
            .into_iter()
            .filter_map(|run| run.text)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct TextRun {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(rename = "tStartMs", default)]
    t_start_ms: Option<i64>,
    #[serde(rename = "dDurationMs", default)]
    d_duration_ms: Option<i64>,
    #[serde(default)]
    segs: Option<Vec<TimedTextSeg>>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: Option<String>,
}
