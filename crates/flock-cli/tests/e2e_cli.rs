//! E2E CLI tests for the offline command surface.
//!
//! Tests validate list/doctor output contracts, config handling, and
//! error reporting. Each test runs `flock` as a subprocess in an
//! isolated temp directory with its own database; nothing here touches
//! the network except the fetch failure test, which targets a closed
//! local port.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the flock binary, rooted in `dir`.
fn flock_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("flock"));
    cmd.current_dir(dir);
    // Suppress tracing output that goes to stderr
    cmd.env("FLOCK_LOG", "error");
    cmd.env_remove("FLOCK_SERVER");
    cmd
}

/// Write a flock.toml pointing the database into `dir`.
fn write_config(dir: &Path) {
    write_config_with_server(dir, "https://example.social");
}

fn write_config_with_server(dir: &Path, server: &str) {
    let db = dir.join("flock.db");
    std::fs::write(
        dir.join("flock.toml"),
        format!(
            "[server]\nbase_url = \"{server}\"\n\n[store]\ndb_path = \"{}\"\n",
            db.display()
        ),
    )
    .expect("write config");
}

/// Seed the database directly, using the same schema the binary creates.
fn seed_statuses(dir: &Path, rows: &[(&str, &str, &str, &str, bool, &str)]) {
    let conn = rusqlite::Connection::open(dir.join("flock.db")).expect("open db");
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS statuses (
            id            TEXT PRIMARY KEY,
            created_at    TEXT NOT NULL,
            in_reply_to   TEXT,
            replies_count INTEGER NOT NULL DEFAULT 0,
            account       TEXT NOT NULL,
            content       TEXT NOT NULL,
            sensitive     INTEGER NOT NULL DEFAULT 0,
            spoiler_text  TEXT NOT NULL DEFAULT ''
        );",
    )
    .expect("create schema");
    for (id, created_at, account, content, sensitive, spoiler) in rows {
        conn.execute(
            "INSERT INTO statuses (id, created_at, account, content, sensitive, spoiler_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![id, created_at, account, content, sensitive, spoiler],
        )
        .expect("insert row");
    }
}

fn list_json(dir: &Path, args: &[&str]) -> Vec<Value> {
    let mut full_args = vec!["list", "--json"];
    full_args.extend_from_slice(args);
    let output = flock_cmd(dir)
        .args(&full_args)
        .output()
        .expect("list should not crash");
    assert!(
        output.status.success(),
        "list failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("list --json should produce a JSON array")
}

// ===========================================================================
// doctor
// ===========================================================================

#[test]
fn doctor_reports_ok_on_fresh_database() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());

    let output = flock_cmd(tmp.path())
        .args(["doctor", "--json"])
        .output()
        .expect("doctor should not crash");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["ok"], Value::Bool(true));
    assert_eq!(json["statuses"], 0);
    assert_eq!(json["integrity"], "ok");
    assert_eq!(json["server"], "https://example.social");
}

#[test]
fn doctor_respects_server_env_override() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());

    let output = flock_cmd(tmp.path())
        .env("FLOCK_SERVER", "https://other.social")
        .args(["doctor", "--json"])
        .output()
        .expect("doctor should not crash");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["server"], "https://other.social");
}

// ===========================================================================
// list
// ===========================================================================

#[test]
fn list_on_empty_store_prints_empty_array() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());

    let rows = list_json(tmp.path(), &[]);
    assert!(rows.is_empty());
}

#[test]
fn list_is_newest_first() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());
    seed_statuses(
        tmp.path(),
        &[
            ("1", "2026-03-01T12:00:00+00:00", "ada", "oldest", false, ""),
            ("3", "2026-03-01T12:02:00+00:00", "bob", "newest", false, ""),
            ("2", "2026-03-01T12:01:00+00:00", "cyn", "middle", false, ""),
        ],
    );

    let rows = list_json(tmp.path(), &[]);
    let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["3", "2", "1"]);
}

#[test]
fn list_honors_limit() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());
    seed_statuses(
        tmp.path(),
        &[
            ("1", "2026-03-01T12:00:00+00:00", "ada", "a", false, ""),
            ("2", "2026-03-01T12:01:00+00:00", "ada", "b", false, ""),
            ("3", "2026-03-01T12:02:00+00:00", "ada", "c", false, ""),
        ],
    );

    let rows = list_json(tmp.path(), &["--limit", "2"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], "3");
}

#[test]
fn list_conceals_sensitive_content() {
    let tmp = TempDir::new().unwrap();
    write_config(tmp.path());
    seed_statuses(
        tmp.path(),
        &[(
            "1",
            "2026-03-01T12:00:00+00:00",
            "ada",
            "the hidden body",
            true,
            "politics",
        )],
    );

    let rows = list_json(tmp.path(), &[]);
    let content = rows[0]["content"].as_str().unwrap();
    assert!(content.contains("CW: politics"));
    assert!(!content.contains("hidden body"));
    assert_eq!(rows[0]["sensitive"], Value::Bool(true));

    // Human output conceals it too.
    flock_cmd(tmp.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicates::str::contains("CW: politics"))
        .stdout(predicates::str::contains("hidden body").not());
}

// ===========================================================================
// config errors
// ===========================================================================

#[test]
fn malformed_config_fails_with_parse_error_code() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("flock.toml"), "[server\nbase_url = oops").unwrap();

    flock_cmd(tmp.path())
        .args(["list", "--json"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("E1001"));
}

#[test]
fn explicit_missing_config_fails() {
    let tmp = TempDir::new().unwrap();

    flock_cmd(tmp.path())
        .args(["--config", "does-not-exist.toml", "doctor"])
        .assert()
        .failure();
}

// ===========================================================================
// fetch failure path
// ===========================================================================

#[test]
fn fetch_against_closed_port_fails_with_fetch_error() {
    let tmp = TempDir::new().unwrap();
    // Port 1 is never listening; connection is refused immediately.
    write_config_with_server(tmp.path(), "http://127.0.0.1:1");

    flock_cmd(tmp.path())
        .args(["fetch", "--json"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("E2001"));
}
