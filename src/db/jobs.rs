//! Job lifecycle and append-only job logs.
//!
//! A job row is created in `running` state before the pipeline does anything
//! else and receives exactly one terminal update; the guard on `status =
//! 'running'` makes a second finish call a no-op instead of a rewrite.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::db::utc_now;
use crate::models::{JobLogLine, JobRecord, JobStatus};

/// Final counters written when a job reaches a terminal state.
#[derive(Debug, Default, Clone, Copy)]
pub struct JobCounters {
    pub total_candidates: u64,
    pub kept_candidates: u64,
    pub transcript_success: u64,
    pub transcript_fail: u64,
}

/// Open a new job in `running` state. Returns the job id.
pub fn create_job(
    conn: &Connection,
    seasons: &[u32],
    include_fallback: bool,
    dry_run: bool,
) -> Result<String> {
    let job_id = uuid::Uuid::new_v4().simple().to_string();
    let seasons_json = serde_json::to_string(seasons)?;

    conn.execute(
        "INSERT INTO jobs (job_id, status, started_at, seasons_json, include_fallback, dry_run)
         VALUES (?1, 'running', ?2, ?3, ?4, ?5)",
        rusqlite::params![job_id, utc_now(), seasons_json, include_fallback, dry_run],
    )
    .context("Failed to create job")?;

    Ok(job_id)
}

/// Append one log line to a job.
pub fn log_job(conn: &Connection, job_id: &str, level: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO job_logs (job_id, created_at, level, message) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![job_id, utc_now(), level, message],
    )
    .context("Failed to append job log")?;
    Ok(())
}

/// Write the terminal state of a job. Does nothing if the job has already
/// reached a terminal state.
pub fn finish_job(
    conn: &Connection,
    job_id: &str,
    status: JobStatus,
    counters: JobCounters,
) -> Result<()> {
    conn.execute(
        "UPDATE jobs
         SET status = ?1,
             finished_at = ?2,
             total_candidates = ?3,
             kept_candidates = ?4,
             transcript_success = ?5,
             transcript_fail = ?6
         WHERE job_id = ?7 AND status = 'running'",
        rusqlite::params![
            status.as_str(),
            utc_now(),
            counters.total_candidates as i64,
            counters.kept_candidates as i64,
            counters.transcript_success as i64,
            counters.transcript_fail as i64,
            job_id,
        ],
    )
    .context("Failed to finish job")?;
    Ok(())
}

/// Fetch one job.
pub fn get_job(conn: &Connection, job_id: &str) -> Result<Option<JobRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM jobs WHERE job_id = ?1",
        JOB_COLUMNS
    ))?;
    let mut rows = stmt.query_map([job_id], read_job_row)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Most recent jobs first, optionally filtered by status.
pub fn list_recent_jobs(
    conn: &Connection,
    limit: usize,
    status: Option<JobStatus>,
) -> Result<Vec<JobRecord>> {
    let mut sql = format!("SELECT {} FROM jobs", JOB_COLUMNS);
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(status) = status {
        sql.push_str(" WHERE status = ?1");
        params.push(Box::new(status.as_str().to_string()));
    }

    sql.push_str(&format!(" ORDER BY started_at DESC LIMIT {}", limit));

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(param_refs.as_slice(), read_job_row)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

/// Log lines for one job, in insertion order.
pub fn get_job_logs(conn: &Connection, job_id: &str, limit: usize) -> Result<Vec<JobLogLine>> {
    let mut stmt = conn.prepare(
        "SELECT created_at, level, message FROM job_logs
         WHERE job_id = ?1 ORDER BY id ASC LIMIT ?2",
    )?;
    let rows = stmt.query_map(rusqlite::params![job_id, limit as i64], |row| {
        Ok(JobLogLine {
            created_at: row.get(0)?,
            level: row.get(1)?,
            message: row.get(2)?,
        })
    })?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

pub fn count_jobs(conn: &Connection) -> Result<u64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get::<_, i64>(0))? as u64)
}

const JOB_COLUMNS: &str = "job_id, status, started_at, finished_at, seasons_json,
    include_fallback, dry_run, total_candidates, kept_candidates,
    transcript_success, transcript_fail";

fn read_job_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobRecord> {
    let status: String = row.get(1)?;
    let seasons_json: String = row.get(4)?;
    let seasons: Vec<u32> = serde_json::from_str(&seasons_json).unwrap_or_default();

    Ok(JobRecord {
        job_id: row.get(0)?,
        status: JobStatus::parse(&status).unwrap_or(JobStatus::Failed),
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        seasons,
        include_fallback: row.get(5)?,
        dry_run: row.get(6)?,
        total_candidates: row.get::<_, Option<i64>>(7)?.unwrap_or(0) as u64,
        kept_candidates: row.get::<_, Option<i64>>(8)?.unwrap_or(0) as u64,
        transcript_success: row.get::<_, Option<i64>>(9)?.unwrap_or(0) as u64,
        transcript_fail: row.get::<_, Option<i64>>(10)?.unwrap_or(0) as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::open_test_db;

    #[test]
    fn job_lifecycle() {
        let conn = open_test_db();
        let job_id = create_job(&conn, &[10, 11], true, false).unwrap();

        let job = get_job(&conn, &job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.seasons, vec![10, 11]);
        assert!(job.include_fallback);
        assert!(!job.dry_run);
        assert!(job.finished_at.is_none());

        finish_job(
            &conn,
            &job_id,
            JobStatus::Completed,
            JobCounters {
                total_candidates: 7,
                kept_candidates: 5,
                transcript_success: 4,
                transcript_fail: 1,
            },
        )
        .unwrap();

        let job = get_job(&conn, &job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.kept_candidates, 5);
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn terminal_state_is_written_once() {
        let conn = open_test_db();
        let job_id = create_job(&conn, &[11], false, false).unwrap();

        finish_job(&conn, &job_id, JobStatus::Failed, JobCounters::default()).unwrap();
        // Second transition must not overwrite the first.
        finish_job(
            &conn,
            &job_id,
            JobStatus::Completed,
            JobCounters {
                total_candidates: 99,
                ..Default::default()
            },
        )
        .unwrap();

        let job = get_job(&conn, &job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.total_candidates, 0);
    }

    #[test]
    fn logs_keep_insertion_order() {
        let conn = open_test_db();
        let job_id = create_job(&conn, &[11], false, false).unwrap();

        log_job(&conn, &job_id, "INFO", "first").unwrap();
        log_job(&conn, &job_id, "INFO", "second").unwrap();
        log_job(&conn, &job_id, "ERROR", "third").unwrap();

        let logs = get_job_logs(&conn, &job_id, 100).unwrap();
        let messages: Vec<&str> = logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(logs[2].level, "ERROR");

        let limited = get_job_logs(&conn, &job_id, 2).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn list_recent_jobs_filters_by_status() {
        let conn = open_test_db();
        let a = create_job(&conn, &[10], true, false).unwrap();
        let _b = create_job(&conn, &[11], true, false).unwrap();
        finish_job(&conn, &a, JobStatus::Completed, JobCounters::default()).unwrap();

        let all = list_recent_jobs(&conn, 10, None).unwrap();
        assert_eq!(all.len(), 2);

        let running = list_recent_jobs(&conn, 10, Some(JobStatus::Running)).unwrap();
        assert_eq!(running.len(), 1);
        let completed = list_recent_jobs(&conn, 10, Some(JobStatus::Completed)).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].job_id, a);
    }
}
