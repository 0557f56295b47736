//! Binary-level tests against a fixture database.

mod common;

use common::{candidate, TestEnv};
use predicates::prelude::*;
use solodex::db::{jobs, videos};
use solodex::models::{SeriesType, TranscriptResult, TranscriptStatus};

/// Three stored episodes (one spin-off, one with a transcript) and one
/// finished job with a few log lines.
fn fixture() -> TestEnv {
    let env = TestEnv::new();
    let conn = env.conn();

    let first = candidate("ep11a000001", 11, Some(1), "나는솔로 11기 1화");
    let mut second = candidate("ep11b000002", 11, Some(2), "나는솔로 11기 2화");
    second.view_count = 2000;
    let mut spin = candidate("spin1200003", 12, None, "나솔사계 12기 특집");
    spin.series_type = SeriesType::Spinoff;

    for c in [&first, &second, &spin] {
        videos::upsert_video(&conn, c).unwrap();
    }

    let mut transcript = TranscriptResult::failure(TranscriptStatus::Success);
    transcript.language = "ko".into();
    transcript.kind = "manual".into();
    transcript.text = "만나서 반갑습니다".into();
    videos::update_transcript(&conn, "ep11a000001", &transcript).unwrap();

    let job_id = jobs::create_job(&conn, &[11, 12], true, false).unwrap();
    jobs::log_job(&conn, &job_id, "INFO", "Collection started for seasons 11, 12").unwrap();
    jobs::log_job(&conn, &job_id, "INFO", "Stored 3 episode records").unwrap();
    jobs::finish_job(
        &conn,
        &job_id,
        solodex::models::JobStatus::Completed,
        solodex::db::jobs::JobCounters {
            total_candidates: 4,
            kept_candidates: 3,
            transcript_success: 1,
            transcript_fail: 0,
        },
    )
    .unwrap();

    env
}

// --- videos ---

#[test]
fn videos_lists_all_records() {
    let env = fixture();
    env.cmd()
        .args(["videos"])
        .assert()
        .success()
        .stdout(predicate::str::contains("나는솔로 11기 1화"))
        .stdout(predicate::str::contains("나는솔로 11기 2화"))
        .stdout(predicate::str::contains("나솔사계 12기 특집"))
        .stdout(predicate::str::contains("3 video(s)"));
}

#[test]
fn videos_json_returns_ordered_array() {
    let env = fixture();
    let output = env.cmd_json().args(["videos"]).output().unwrap();

    assert!(output.status.success());
    let records: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.len(), 3);
    // Season 11 episodes first, in episode order.
    assert_eq!(records[0]["video_id"], "ep11a000001");
    assert_eq!(records[1]["video_id"], "ep11b000002");
    assert_eq!(records[2]["video_id"], "spin1200003");
}

#[test]
fn videos_filters_by_season() {
    let env = fixture();
    let output = env
        .cmd_json()
        .args(["videos", "--seasons", "12"])
        .output()
        .unwrap();

    let records: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["video_id"], "spin1200003");
}

#[test]
fn videos_filters_by_transcript_state() {
    let env = fixture();
    let output = env
        .cmd_json()
        .args(["videos", "--transcripts", "only"])
        .output()
        .unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["video_id"], "ep11a000001");

    let output = env
        .cmd_json()
        .args(["videos", "--transcripts", "missing"])
        .output()
        .unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn videos_main_only_excludes_spinoffs() {
    let env = fixture();
    let output = env
        .cmd_json()
        .args(["videos", "--main-only"])
        .output()
        .unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn videos_rejects_bad_transcript_filter() {
    let env = fixture();
    env.cmd()
        .args(["videos", "--transcripts", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid transcript filter"));
}

// --- show ---

#[test]
fn show_prints_record_details() {
    let env = fixture();
    env.cmd()
        .args(["show", "ep11a000001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("나는솔로 11기 1화"))
        .stdout(predicate::str::contains("ep11a000001"))
        .stdout(predicate::str::contains("success"));
}

#[test]
fn show_json_has_fields() {
    let env = fixture();
    let output = env
        .cmd_json()
        .args(["show", "ep11b000002"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["video_id"], "ep11b000002");
    assert_eq!(record["season"], 11);
    assert_eq!(record["episode"], 2);
    assert_eq!(record["transcript_status"], "pending");
}

#[test]
fn show_transcript_only_outputs_text() {
    let env = fixture();
    env.cmd()
        .args(["show", "ep11a000001", "--transcript"])
        .assert()
        .success()
        .stdout(predicate::str::contains("만나서 반갑습니다"));
}

#[test]
fn show_transcript_fails_when_missing() {
    let env = fixture();
    env.cmd()
        .args(["show", "ep11b000002", "--transcript"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No transcript stored"));
}

#[test]
fn show_unknown_id_exits_nonzero() {
    let env = fixture();
    env.cmd()
        .args(["show", "doesnotexist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No video found"));
}

// --- jobs / logs ---

#[test]
fn jobs_lists_recent_jobs() {
    let env = fixture();
    env.cmd()
        .args(["jobs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"))
        .stdout(predicate::str::contains("3 kept / 4 found"));
}

#[test]
fn jobs_json_filter_by_status() {
    let env = fixture();
    let output = env
        .cmd_json()
        .args(["jobs", "--status", "completed"])
        .output()
        .unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "completed");

    let output = env
        .cmd_json()
        .args(["jobs", "--status", "failed"])
        .output()
        .unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(records.is_empty());
}

#[test]
fn logs_prints_lines_in_order() {
    let env = fixture();
    let conn = env.conn();
    let job_id = jobs::list_recent_jobs(&conn, 1, None).unwrap()[0].job_id.clone();
    drop(conn);

    let output = env.cmd().args(["logs", &job_id]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let started = stdout.find("Collection started").unwrap();
    let stored = stdout.find("Stored 3 episode records").unwrap();
    assert!(started < stored);
}

#[test]
fn logs_unknown_job_exits_nonzero() {
    let env = fixture();
    env.cmd()
        .args(["logs", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No job found"));
}

// --- info ---

#[test]
fn info_json_reports_counts() {
    let env = fixture();
    let output = env.cmd_json().args(["info"]).output().unwrap();

    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["videos"], 3);
    assert_eq!(info["jobs"], 1);
    assert_eq!(info["schema_version"], 2);
    assert_eq!(info["transcript_status"]["success"], 1);
    assert_eq!(info["seasons"], serde_json::json!([11, 12]));
}

// --- collect argument validation ---

#[test]
fn collect_requires_seasons_flag() {
    let env = fixture();
    env.cmd().args(["collect"]).assert().failure();
}

#[test]
fn collect_rejects_non_numeric_seasons() {
    let env = fixture();
    env.cmd()
        .args(["collect", "--seasons", "eleven"])
        .assert()
        .failure();
}
