use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Config pointing at a temp database and the offline stub backend
fn write_config(dir: &TempDir) -> PathBuf {
    let db_path = dir.path().join("state.sqlite");
    let content = format!(
        "[general]\nstate_db_path = {:?}\nsettle_delay_ms = 0\n\n[x]\nbackend = \"stub\"\n\n[hashtags]\ndefaults = \"blog\"\n",
        db_path.display().to_string()
    );
    let path = dir.path().join("config.toml");
    fs::write(&path, content).expect("write config");
    path
}

fn write_event(dir: &TempDir, name: &str, previous: &str, new: &str) -> PathBuf {
    let event = serde_json::json!({
        "item": {
            "id": 7,
            "title": "Hello world",
            "url": "https://example.com/hello-world",
            "published_at": "2026-01-01T00:00:00Z",
            "taxonomy_terms": ["Rust"]
        },
        "previous_status": previous,
        "new_status": new
    });
    let path = dir.path().join(name);
    fs::write(&path, event.to_string()).expect("write event");
    path
}

fn handle(config: &Path, event: &Path) -> Value {
    let output = cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(config)
        .args(["handle", "--file"])
        .arg(event)
        .output()
        .expect("run handle");

    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");

    let mut cmd = cargo_bin_cmd!("x-autopost");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    let parsed: toml::Value = toml::from_str(&content).expect("valid toml");
    assert_eq!(parsed["update"]["interval_secs"].as_integer(), Some(3600));
    assert!(content.contains("api_key_env"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# mine\n").expect("write config");

    let mut cmd = cargo_bin_cmd!("x-autopost");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "# mine\n");
}

#[test]
fn new_publish_is_posted_once() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let event = write_event(&dir, "publish.json", "draft", "publish");

    let first = handle(&config, &event);
    assert_eq!(first["transition"], "new_publish");
    assert_eq!(first["outcome"], "posted");
    assert_eq!(first["remote_id"], "stub_1");

    let second = handle(&config, &event);
    assert_eq!(second["outcome"], "skipped");
    assert_eq!(second["reason"], "already posted");
}

#[test]
fn ignored_transition_is_skipped() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let event = write_event(&dir, "trash.json", "publish", "trash");

    let value = handle(&config, &event);
    assert_eq!(value["transition"], "ignored");
    assert_eq!(value["outcome"], "skipped");
}

#[test]
fn dry_run_does_not_mark_posted() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let event = write_event(&dir, "publish.json", "draft", "publish");

    let output = cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .args(["handle", "--dry-run", "--file"])
        .arg(&event)
        .output()
        .expect("run handle");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["reason"], "dry run");

    assert_eq!(handle(&config, &event)["outcome"], "posted");
}

#[test]
fn handle_rejects_malformed_event() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let event = dir.path().join("bad.json");
    fs::write(&event, "{ not json").expect("write event");

    cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .args(["handle", "--file"])
        .arg(&event)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid transition event JSON"));
}

#[test]
fn listen_handles_each_line_and_skips_garbage() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let event = fs::read_to_string(write_event(&dir, "e.json", "draft", "publish")).unwrap();
    let input = format!("{}\nnot json\n\n{}\n", event, event);

    let output = cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .arg("listen")
        .write_stdin(input)
        .output()
        .expect("run listen");
    assert!(output.status.success());

    let lines: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json"))
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["outcome"], "posted");
    assert_eq!(lines[1]["outcome"], "skipped");
}

#[test]
fn hashtags_set_show_and_preview() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let event = write_event(&dir, "publish.json", "draft", "publish");

    cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .args(["hashtags", "set", "7", "#tokio, serde"])
        .assert()
        .success();

    cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .args(["hashtags", "show", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#tokio, serde"));

    cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .args(["hashtags", "preview", "--file"])
        .arg(&event)
        .assert()
        .success()
        .stdout(predicate::str::diff("#tokio #serde #blog\n"));
}

#[test]
fn notice_show_when_empty() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);

    cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .args(["notice", "show", "--clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending notice"));

    cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .args(["notice", "clear"])
        .assert()
        .success();
}

#[test]
fn test_post_uses_stub_backend() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);

    cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .arg("test-post")
        .assert()
        .success()
        .stdout(predicate::str::contains("stub_1"));
}

#[test]
fn test_post_without_credentials_fails() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);

    cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .env("X_AUTOPOST__X__BACKEND", "api")
        .env("X_AUTOPOST__X__API_KEY_ENV", "X_AUTOPOST_TEST_UNSET_KEY")
        .arg("test-post")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid credentials"));
}

#[test]
fn doctor_outputs_json_report() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);

    let output = cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["config"]["status"], "ok");
    assert_eq!(value["state"]["status"], "ok");
    assert_eq!(value["overall"], "warn");
}

#[test]
fn doctor_rejects_bad_update_interval() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);

    cargo_bin_cmd!("x-autopost")
        .arg("--config")
        .arg(&config)
        .env("X_AUTOPOST__UPDATE__INTERVAL_SECS", "42")
        .args(["doctor", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"settings\""));
}
