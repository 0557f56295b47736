//! Episode record storage.
//!
//! All writes are single-row upserts keyed by `video_id`. The merge rule is
//! the conflict-resolution contract for repeated discoveries of the same
//! video: metadata fields follow the newest write, `season`/`episode` are
//! never regressed to NULL, and the source/officialness fields only move
//! when the incoming write carries an equal or higher source priority.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::db::utc_now;
use crate::models::{
    Candidate, SeasonSummary, SeriesType, SourceKind, TranscriptResult, TranscriptSegment,
    TranscriptStatus, VideoRecord,
};

/// Transcript-based filter for `get_videos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFilter {
    /// Only videos with a successfully stored transcript.
    Only,
    /// Only videos still missing one.
    Missing,
}

impl TranscriptFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "only" => Some(TranscriptFilter::Only),
            "missing" => Some(TranscriptFilter::Missing),
            _ => None,
        }
    }
}

/// Insert or merge one enriched candidate.
pub fn upsert_video(conn: &Connection, candidate: &Candidate) -> Result<()> {
    let now = utc_now();
    let title = if candidate.title.trim().is_empty() {
        "(제목 없음)"
    } else {
        candidate.title.trim()
    };

    conn.execute(
        "INSERT INTO videos (
            video_id, title, url, channel_title, channel_id, channel_url, description,
            duration_seconds, duration_text, upload_date, published_ts,
            view_count, like_count, comment_count, season, episode, series_type,
            source, is_official, source_priority, dedupe_key, discovered_at, updated_at
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19, ?20, ?21, ?22, ?22)
         ON CONFLICT(video_id) DO UPDATE SET
            title = excluded.title,
            url = excluded.url,
            channel_title = excluded.channel_title,
            channel_id = excluded.channel_id,
            channel_url = excluded.channel_url,
            description = excluded.description,
            duration_seconds = excluded.duration_seconds,
            duration_text = excluded.duration_text,
            upload_date = excluded.upload_date,
            published_ts = excluded.published_ts,
            view_count = excluded.view_count,
            like_count = excluded.like_count,
            comment_count = excluded.comment_count,
            season = COALESCE(excluded.season, videos.season),
            episode = COALESCE(excluded.episode, videos.episode),
            series_type = excluded.series_type,
            source = CASE
                WHEN excluded.source_priority >= videos.source_priority THEN excluded.source
                ELSE videos.source
            END,
            is_official = CASE
                WHEN excluded.source_priority >= videos.source_priority THEN excluded.is_official
                ELSE videos.is_official
            END,
            source_priority = MAX(videos.source_priority, excluded.source_priority),
            dedupe_key = COALESCE(excluded.dedupe_key, videos.dedupe_key),
            updated_at = excluded.updated_at",
        rusqlite::params![
            candidate.video_id,
            title,
            candidate.url,
            candidate.channel_title,
            candidate.channel_id,
            candidate.channel_url,
            candidate.description,
            candidate.duration_seconds as i64,
            candidate.duration_text,
            candidate.upload_date,
            candidate.published_ts,
            candidate.view_count as i64,
            candidate.like_count as i64,
            candidate.comment_count as i64,
            candidate.season,
            candidate.episode,
            candidate.series_type.as_str(),
            candidate.source.as_str(),
            candidate.is_official,
            candidate.source_priority,
            candidate.dedupe_key,
            now,
        ],
    )
    .with_context(|| format!("Failed to upsert video {}", candidate.video_id))?;

    Ok(())
}

/// Persist the outcome of one transcript retrieval attempt.
pub fn update_transcript(
    conn: &Connection,
    video_id: &str,
    transcript: &TranscriptResult,
) -> Result<()> {
    let now = utc_now();
    let segments_json = serde_json::to_string(&transcript.segments)?;

    conn.execute(
        "UPDATE videos
         SET transcript_status = ?1,
             transcript_language = ?2,
             transcript_kind = ?3,
             transcript_text = ?4,
             transcript_segments = ?5,
             transcript_hash = ?6,
             transcript_updated_at = ?7,
             error_message = ?8,
             updated_at = ?7
         WHERE video_id = ?9",
        rusqlite::params![
            transcript.status.as_str(),
            transcript.language,
            transcript.kind,
            transcript.text,
            segments_json,
            transcript.content_hash,
            now,
            transcript.error_message,
            video_id,
        ],
    )
    .with_context(|| format!("Failed to update transcript for {}", video_id))?;

    Ok(())
}

/// Fetch one episode record.
pub fn get_video(conn: &Connection, video_id: &str) -> Result<Option<VideoRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM videos WHERE video_id = ?1",
        VIDEO_COLUMNS
    ))?;

    let mut rows = stmt.query_map([video_id], read_video_row)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// True when the stored record has a successfully fetched transcript.
pub fn video_has_transcript(conn: &Connection, video_id: &str) -> Result<bool> {
    let status: Option<String> = conn
        .query_row(
            "SELECT transcript_status FROM videos WHERE video_id = ?1",
            [video_id],
            |row| row.get(0),
        )
        .ok();
    Ok(status.as_deref() == Some(TranscriptStatus::Success.as_str()))
}

/// Ordered episode listing: season, then episode (unknown last), then upload
/// date, then video id.
pub fn get_videos(
    conn: &Connection,
    seasons: Option<&[u32]>,
    transcript: Option<TranscriptFilter>,
    main_only: bool,
    limit: Option<usize>,
) -> Result<Vec<VideoRecord>> {
    let mut sql = format!("SELECT {} FROM videos WHERE 1=1", VIDEO_COLUMNS);
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(seasons) = seasons {
        if !seasons.is_empty() {
            let placeholders = vec!["?"; seasons.len()].join(",");
            sql.push_str(&format!(" AND season IN ({})", placeholders));
            for season in seasons {
                params.push(Box::new(*season));
            }
        }
    }

    match transcript {
        Some(TranscriptFilter::Only) => sql.push_str(" AND transcript_status = 'success'"),
        Some(TranscriptFilter::Missing) => sql.push_str(" AND transcript_status != 'success'"),
        None => {}
    }

    if main_only {
        sql.push_str(" AND series_type = 'main'");
    }

    sql.push_str(
        " ORDER BY COALESCE(season, 999), COALESCE(episode, 9999),
          COALESCE(upload_date, '9999-99-99'), video_id",
    );

    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(param_refs.as_slice(), read_video_row)?;

    Ok(rows.filter_map(|r| r.ok()).collect())
}

/// All seasons that have at least one stored video.
pub fn get_available_seasons(conn: &Connection) -> Result<Vec<u32>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT season FROM videos WHERE season IS NOT NULL ORDER BY season",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, u32>(0))?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

/// Per-season aggregate: total videos, transcript successes, and average
/// comment/view engagement.
pub fn get_season_summary(conn: &Connection, seasons: Option<&[u32]>) -> Result<Vec<SeasonSummary>> {
    let mut sql = String::from(
        "SELECT
            season,
            COUNT(*) AS total_videos,
            SUM(CASE WHEN transcript_status = 'success' THEN 1 ELSE 0 END) AS transcript_success,
            ROUND(AVG(CASE WHEN view_count > 0 THEN CAST(comment_count AS REAL) / view_count ELSE 0 END), 6) AS avg_engagement
         FROM videos",
    );
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(seasons) = seasons {
        if !seasons.is_empty() {
            let placeholders = vec!["?"; seasons.len()].join(",");
            sql.push_str(&format!(" WHERE season IN ({})", placeholders));
            for season in seasons {
                params.push(Box::new(*season));
            }
        }
    }

    sql.push_str(" GROUP BY season ORDER BY season");

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(param_refs.as_slice(), |row| {
        Ok(SeasonSummary {
            season: row.get(0)?,
            total_videos: row.get::<_, i64>(1)? as u64,
            transcript_success: row.get::<_, Option<i64>>(2)?.unwrap_or(0) as u64,
            avg_engagement: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
        })
    })?;

    Ok(rows.filter_map(|r| r.ok()).collect())
}

/// Count of stored videos per transcript status, for `info`.
pub fn transcript_status_counts(conn: &Connection) -> Result<BTreeMap<String, u64>> {
    let mut stmt = conn.prepare(
        "SELECT transcript_status, COUNT(*) FROM videos GROUP BY transcript_status",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
    })?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn count_videos(conn: &Connection) -> Result<u64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM videos", [], |row| row.get::<_, i64>(0))? as u64)
}

// ============================================================================
// Row mapping
// ============================================================================

const VIDEO_COLUMNS: &str = "video_id, title, url, channel_title, channel_id, channel_url,
    description, duration_seconds, duration_text, upload_date, published_ts,
    view_count, like_count, comment_count, season, episode, series_type, source,
    is_official, source_priority, dedupe_key, transcript_status, transcript_language,
    transcript_kind, transcript_text, transcript_segments, transcript_hash,
    transcript_updated_at, error_message, discovered_at, updated_at";

fn read_video_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VideoRecord> {
    let series_type: String = row.get::<_, Option<String>>(16)?.unwrap_or_default();
    let source: String = row.get::<_, Option<String>>(17)?.unwrap_or_default();
    let transcript_status: String = row.get::<_, Option<String>>(21)?.unwrap_or_default();
    let segments_json: Option<String> = row.get(25)?;

    let transcript_segments: Vec<TranscriptSegment> = segments_json
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();

    Ok(VideoRecord {
        video_id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        channel_title: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        channel_id: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        channel_url: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        duration_seconds: row.get::<_, Option<i64>>(7)?.unwrap_or(0) as u64,
        duration_text: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        upload_date: row.get(9)?,
        published_ts: row.get::<_, Option<i64>>(10)?.unwrap_or(0),
        view_count: row.get::<_, Option<i64>>(11)?.unwrap_or(0) as u64,
        like_count: row.get::<_, Option<i64>>(12)?.unwrap_or(0) as u64,
        comment_count: row.get::<_, Option<i64>>(13)?.unwrap_or(0) as u64,
        season: row.get(14)?,
        episode: row.get(15)?,
        series_type: SeriesType::parse(&series_type),
        source: SourceKind::parse(&source),
        is_official: row.get::<_, Option<bool>>(18)?.unwrap_or(false),
        source_priority: row.get::<_, Option<i64>>(19)?.unwrap_or(0),
        dedupe_key: row.get(20)?,
        transcript_status: TranscriptStatus::parse(&transcript_status),
        transcript_language: row.get(22)?,
        transcript_kind: row.get(23)?,
        transcript_text: row.get(24)?,
        transcript_segments,
        transcript_hash: row.get(26)?,
        transcript_updated_at: row.get(27)?,
        error_message: row.get(28)?,
        discovered_at: row.get(29)?,
        updated_at: row.get(30)?,
    })
}
