//! Storage primitives for saved analysis snapshots.
//!
//! The scoring heuristics live in a separate tool; this module only persists
//! and reads back the named snapshots that tool produces, so a view stays
//! reproducible after the underlying video set changes.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::utc_now;

/// A named, reproducible snapshot of scored video references.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    pub id: i64,
    pub name: String,
    pub view_type: String,
    pub query: String,
    pub seasons: Vec<u32>,
    pub created_at: String,
}

/// One scored reference inside a view.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisViewItem {
    pub video_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub score: f64,
    pub reason: String,
    /// Joined from the videos table when reading a view back; missing when
    /// the referenced video has since been deleted.
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Item payload accepted by `save_analysis_view`.
#[derive(Debug, Clone)]
pub struct NewViewItem {
    pub video_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub score: f64,
    pub reason: String,
}

/// Persist a snapshot with its items. Returns the view id.
pub fn save_analysis_view(
    conn: &Connection,
    name: &str,
    view_type: &str,
    query: &str,
    seasons: &[u32],
    items: &[NewViewItem],
) -> Result<i64> {
    let seasons_json = serde_json::to_string(seasons)?;
    conn.execute(
        "INSERT INTO analysis_views (name, view_type, query, seasons_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![name, view_type, query, seasons_json, utc_now()],
    )
    .context("Failed to save analysis view")?;

    let view_id = conn.last_insert_rowid();

    let mut stmt = conn.prepare(
        "INSERT INTO analysis_view_items (view_id, video_id, season, episode, score, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for item in items {
        stmt.execute(rusqlite::params![
            view_id,
            item.video_id,
            item.season,
            item.episode,
            item.score,
            item.reason,
        ])?;
    }

    Ok(view_id)
}

/// Most recent views first.
pub fn list_analysis_views(conn: &Connection, limit: usize) -> Result<Vec<AnalysisView>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, view_type, query, seasons_json, created_at
         FROM analysis_views ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit as i64], read_view_row)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

/// One view with its items, highest score first.
pub fn get_analysis_view(
    conn: &Connection,
    view_id: i64,
) -> Result<Option<(AnalysisView, Vec<AnalysisViewItem>)>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, view_type, query, seasons_json, created_at
         FROM analysis_views WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map([view_id], read_view_row)?;
    let Some(view) = rows.next() else {
        return Ok(None);
    };
    let view = view?;

    let mut stmt = conn.prepare(
        "SELECT i.video_id, i.season, i.episode, i.score, i.reason, v.title, v.url
         FROM analysis_view_items AS i
         LEFT JOIN videos AS v ON i.video_id = v.video_id
         WHERE i.view_id = ?1
         ORDER BY i.score DESC, i.season ASC, i.episode ASC",
    )?;
    let items = stmt.query_map([view_id], |row| {
        Ok(AnalysisViewItem {
            video_id: row.get(0)?,
            season: row.get(1)?,
            episode: row.get(2)?,
            score: row.get(3)?,
            reason: row.get(4)?,
            title: row.get(5)?,
            url: row.get(6)?,
        })
    })?;

    Ok(Some((view, items.filter_map(|r| r.ok()).collect())))
}

fn read_view_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisView> {
    let seasons_json: String = row.get(4)?;
    Ok(AnalysisView {
        id: row.get(0)?,
        name: row.get(1)?,
        view_type: row.get(2)?,
        query: row.get(3)?,
        seasons: serde_json::from_str(&seasons_json).unwrap_or_default(),
        created_at: row.get(5)?,
    })
}
