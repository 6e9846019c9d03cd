//! End-to-end tests for the `startdeck` command-line interface.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

mod fixtures;
use fixtures::{sample_snapshot, temp_dir, write_json};

/// Path to the startdeck binary (set by cargo at compile time)
fn startdeck_bin() -> &'static str {
    env!("CARGO_BIN_EXE_startdeck")
}

/// Runs `startdeck <args> --data-dir <dir>`.
fn run(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(startdeck_bin())
        .args(args)
        .arg("--data-dir")
        .arg(data_dir)
        .output()
        .expect("Failed to execute command")
}

fn assert_success(output: &Output) {
    assert_eq!(
        output.status.code(),
        Some(0),
        "command failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// Imports the sample backup into a fresh data directory.
fn seeded_dir() -> tempfile::TempDir {
    let dir = temp_dir();
    let backup = write_json(dir.path(), "backup.json", &sample_snapshot());
    let output = run(&dir.path().join("data"), &["import", backup.to_str().unwrap()]);
    assert_success(&output);
    dir
}

// ============================================================================
// Catalog commands
// ============================================================================

#[test]
fn test_list_empty_catalog() {
    let dir = temp_dir();
    let output = run(dir.path(), &["list"]);

    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No sites"), "unexpected output: {stdout}");
}

#[test]
fn test_import_then_list_json() {
    let dir = seeded_dir();
    let output = run(&dir.path().join("data"), &["list", "--json"]);
    assert_success(&output);

    let body = stdout_json(&output);
    assert_eq!(body["count"], 2, "hidden category 'Fun' is not listed");
    assert_eq!(body["tabs"], serde_json::json!(["All", "Dev"]));
    assert_eq!(body["sites"][0]["id"], "gh");
    assert_eq!(body["glyphs"]["gh"]["kind"], "image");
    assert_eq!(body["glyphs"]["docs"]["kind"], "library");
    assert_eq!(body["glyphs"]["docs"]["key"], "book");
}

#[test]
fn test_list_search_query() {
    let dir = seeded_dir();
    let output = run(&dir.path().join("data"), &["list", "--json", "--query", "rust"]);
    assert_success(&output);
    assert_eq!(stdout_json(&output)["sites"][0]["id"], "docs");

    let output = run(
        &dir.path().join("data"),
        &["list", "--query", "rust lang", "--engine", "duckduckgo"],
    );
    assert_success(&output);
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "https://duckduckgo.com/?q=rust+lang"
    );
}

#[test]
fn test_import_invalid_file_exits_with_validation_error() {
    let dir = temp_dir();
    let backup = write_json(dir.path(), "bad.json", &serde_json::json!({ "sites": 42 }));
    let output = run(&dir.path().join("data"), &["import", backup.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("sites"));
    assert!(!dir.path().join("data").join("sites.json").exists());
}

#[test]
fn test_import_missing_file_exits_with_io_error() {
    let dir = temp_dir();
    let output = run(dir.path(), &["import", "/tmp/startdeck_missing_backup_xyz.json"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_export_round_trips_through_import() {
    let dir = seeded_dir();
    let exported = dir.path().join("export.json");
    let output = run(
        &dir.path().join("data"),
        &["export", "--output", exported.to_str().unwrap()],
    );
    assert_success(&output);

    let other = dir.path().join("other");
    assert_success(&run(&other, &["import", exported.to_str().unwrap()]));

    let first = run(&dir.path().join("data"), &["export"]);
    let second = run(&other, &["export"]);
    assert_eq!(stdout_json(&first), stdout_json(&second));
}

// ============================================================================
// Site commands
// ============================================================================

#[test]
fn test_site_add_move_delete() {
    let dir = seeded_dir();
    let data = dir.path().join("data");

    assert_success(&run(
        &data,
        &[
            "site", "add", "--name", "Crates", "--url", "https://crates.io", "--category", "Dev",
            "--id", "crates",
        ],
    ));
    assert_success(&run(&data, &["site", "move", "crates", "--to", "gh"]));

    let listed = stdout_json(&run(&data, &["list", "--json", "--category", "Dev"]));
    let ids: Vec<&str> = listed["sites"]
        .as_array()
        .unwrap()
        .iter()
        .map(|site| site["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["crates", "gh", "docs"]);

    assert_success(&run(&data, &["site", "delete", "crates"]));
    let output = run(&data, &["site", "delete", "crates"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_site_add_unknown_category() {
    let dir = temp_dir();
    let output = run(
        dir.path(),
        &["site", "add", "--name", "X", "--url", "https://x.com", "--category", "Nope"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nope"));
}

// ============================================================================
// Category commands
// ============================================================================

#[test]
fn test_category_add_and_list() {
    let dir = temp_dir();
    assert_success(&run(dir.path(), &["category", "add", "Work"]));
    assert_success(&run(dir.path(), &["category", "add", "Home"]));

    let output = run(dir.path(), &["category", "add", "Work"]);
    assert_eq!(output.status.code(), Some(1), "duplicate names are rejected");

    let body = stdout_json(&run(dir.path(), &["category", "list", "--json"]));
    assert_eq!(body["count"], 2);
    assert_eq!(body["categories"][0]["name"], "Work");
    assert!(body["categories"][0]["color"].as_str().unwrap().starts_with('#'));
}

#[test]
fn test_category_add_reserved_name() {
    let dir = temp_dir();
    let output = run(dir.path(), &["category", "add", "All"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_category_toggle_color_move() {
    let dir = seeded_dir();
    let data = dir.path().join("data");

    assert_success(&run(&data, &["category", "toggle", "Fun"]));
    assert_success(&run(&data, &["category", "color", "Fun", "#ABCDEF"]));
    assert_success(&run(&data, &["category", "move", "Fun", "--direction", "up"]));

    let body = stdout_json(&run(&data, &["category", "list", "--json"]));
    assert_eq!(body["categories"][0]["name"], "Fun");
    assert_eq!(body["categories"][0]["hidden"], false);
    assert_eq!(body["categories"][0]["color"], "#ABCDEF");

    let output = run(&data, &["category", "color", "Fun", "purple"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_category_delete_cascades() {
    let dir = seeded_dir();
    let data = dir.path().join("data");

    let output = run(&data, &["category", "delete", "Dev"]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("2 sites removed"));

    let exported = stdout_json(&run(&data, &["export"]));
    let sites = exported["sites"].as_array().unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0]["category"], "Fun");

    let output = run(&data, &["category", "delete", "Dev"]);
    assert_eq!(output.status.code(), Some(1));
}

// ============================================================================
// Config commands
// ============================================================================

/// Runs `startdeck <args>` without a data directory.
fn run_plain(args: &[&str]) -> Output {
    Command::new(startdeck_bin())
        .args(args)
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_config_init_and_show() {
    let dir = temp_dir();
    let path = dir.path().join("nested").join("config.toml");
    let path = path.to_str().unwrap();

    assert_success(&run_plain(&["config", "init", "--path", path]));
    let output = run_plain(&["config", "init", "--path", path]);
    assert_eq!(output.status.code(), Some(1), "existing file is kept");
    assert_success(&run_plain(&["config", "init", "--path", path, "--force"]));

    let output = run_plain(&["config", "show", "--path", path]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port = 3001"), "unexpected output: {stdout}");
    assert!(stdout.contains("{host}"));
}
