//! Integration tests for the `sitegrid` CLI binary.
//!
//! These tests cover argument parsing, completions, config handling and
//! the cache-only (`--offline`) paths, all without a remote store.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `sitegrid` binary with env isolation.
///
/// Config and data live under `home`; every `SITEGRID_*` override that
/// could leak in from the caller is removed.
fn sitegrid_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sitegrid");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("SITEGRID_CONFIG", home.join("config.toml"))
        .env("SITEGRID_CACHE__DIR", home.join("store"))
        .env("NO_COLOR", "1")
        .env_remove("SITEGRID_URL")
        .env_remove("SITEGRID_TABLE")
        .env_remove("SITEGRID_API_KEY")
        .env_remove("SITEGRID_OUTPUT")
        .env_remove("SITEGRID_OFFLINE")
        .env_remove("SITEGRID_TIMEOUT")
        .env_remove("SITEGRID_REMOTE__URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn site(id: i64, zone: u32, stars: u8, status: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Hotel {id}"),
        "latitude": 41.9,
        "longitude": 12.5,
        "star_rating": stars,
        "zone": zone,
        "status": status,
        "phase": null,
        "notes": null,
        "address": null,
        "capacity": null,
    })
}

/// Write a cache snapshot the way the engine stores it.
fn seed_cache(home: &Path, sites: &[Value]) {
    let dir = home.join("store");
    std::fs::create_dir_all(&dir).unwrap();
    let payload = json!({ "captured_at": "2024-01-01T00:00:00Z", "sites": sites });
    std::fs::write(dir.join("sites_cache.json"), payload.to_string()).unwrap();
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = sitegrid_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    sitegrid_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("sites")
            .and(predicate::str::contains("highlight"))
            .and(predicate::str::contains("cache")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    sitegrid_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sitegrid"));
}

#[test]
fn test_invalid_subcommand() {
    let home = TempDir::new().unwrap();
    let output = sitegrid_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("foobar") || text.contains("unrecognized"), "{text}");
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    sitegrid_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = TempDir::new().unwrap();
    sitegrid_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let home = TempDir::new().unwrap();
    let expected = home.path().join("config.toml");
    sitegrid_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn test_config_init_then_show() {
    let home = TempDir::new().unwrap();
    sitegrid_cmd(home.path())
        .args(["config", "init", "--url", "http://localhost:5000"])
        .assert()
        .success();
    assert!(home.path().join("config.toml").exists());

    sitegrid_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("url = \"http://localhost:5000\"")
                .and(predicate::str::contains("table = \"hotels\"")),
        );

    let output = sitegrid_cmd(home.path())
        .args(["config", "init", "--url", "http://localhost:6000"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "second init needs --force");
}

#[test]
fn test_config_init_rejects_bad_url() {
    let home = TempDir::new().unwrap();
    let output = sitegrid_cmd(home.path())
        .args(["config", "init", "--url", "not a url"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!home.path().join("config.toml").exists());
}

// ── Sites ───────────────────────────────────────────────────────────

#[test]
fn test_sites_list_without_remote() {
    let home = TempDir::new().unwrap();
    let output = sitegrid_cmd(home.path()).args(["sites", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(7));
    let text = combined_output(&output);
    assert!(text.contains("No remote URL configured"), "{text}");
}

#[test]
fn test_sites_list_offline_empty_cache() {
    let home = TempDir::new().unwrap();
    let output = sitegrid_cmd(home.path())
        .args(["sites", "list", "--offline", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(stdout_json(&output), json!([]));
}

#[test]
fn test_sites_list_offline_filters_cached_sites() {
    let home = TempDir::new().unwrap();
    seed_cache(
        home.path(),
        &[
            site(1, 3, 4, "Green"),
            site(2, 3, 2, "Yellow"),
            site(3, 5, 4, "Red"),
        ],
    );

    let output = sitegrid_cmd(home.path())
        .args(["sites", "list", "--offline", "--zone", "III", "--stars", "4", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let rows = stdout_json(&output);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], 1);
    assert_eq!(rows[0]["status"], "VERDE");
    assert_eq!(rows[0]["fill_color"], "#22c55e");

    sitegrid_cmd(home.path())
        .args(["sites", "list", "--offline", "-o", "plain"])
        .assert()
        .success()
        .stdout("1\n2\n3\n");
}

#[test]
fn test_sites_list_rejects_unknown_zone() {
    let home = TempDir::new().unwrap();
    let output = sitegrid_cmd(home.path())
        .args(["sites", "list", "--offline", "--zone", "XX"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_sites_show_offline() {
    let home = TempDir::new().unwrap();
    seed_cache(home.path(), &[site(2, 4, 3, "Yellow")]);

    let output = sitegrid_cmd(home.path())
        .args(["sites", "show", "2", "--offline", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let view = stdout_json(&output);
    assert_eq!(view["status"], "GIALLO");
    assert_eq!(view["zone"], "IV");
    assert_eq!(view["latitude"], "41.90000");
    assert_eq!(view["show_phase_controls"], true);

    let missing = sitegrid_cmd(home.path())
        .args(["sites", "show", "99", "--offline"])
        .output()
        .unwrap();
    assert_eq!(missing.status.code(), Some(4));
}

#[test]
fn test_sites_edit_needs_remote() {
    let home = TempDir::new().unwrap();
    let output = sitegrid_cmd(home.path())
        .args(["sites", "edit", "1", "--status", "ROSSO", "--offline"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("needs the remote store"));
}

// ── Highlights & cache ──────────────────────────────────────────────

#[test]
fn test_highlight_toggle_round_trip() {
    let home = TempDir::new().unwrap();
    sitegrid_cmd(home.path()).args(["highlight", "toggle", "7"]).assert().success();

    sitegrid_cmd(home.path())
        .args(["highlight", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout("7\n");

    sitegrid_cmd(home.path()).args(["highlight", "toggle", "7"]).assert().success();
    sitegrid_cmd(home.path())
        .args(["highlight", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_cache_status_empty() {
    let home = TempDir::new().unwrap();
    let output = sitegrid_cmd(home.path())
        .args(["cache", "status", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let status = stdout_json(&output);
    assert_eq!(status["present"], false);
    assert_eq!(status["sites"], 0);
}

#[test]
fn test_cache_clear_removes_snapshot() {
    let home = TempDir::new().unwrap();
    seed_cache(home.path(), &[site(1, 1, 3, "Green")]);

    let output = sitegrid_cmd(home.path())
        .args(["cache", "status", "-o", "json"])
        .output()
        .unwrap();
    let status = stdout_json(&output);
    assert_eq!(status["present"], true);
    assert_eq!(status["fresh"], false);
    assert_eq!(status["sites"], 1);

    sitegrid_cmd(home.path()).args(["cache", "clear"]).assert().success();
    assert!(!home.path().join("store").join("sites_cache.json").exists());
}
