//! CLI integration tests for logo-review-cli.
//!
//! These tests run the actual binary, mostly against the `--mock` catalog,
//! and check outputs and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// Get a Command for the logo-review binary with a clean environment.
fn logo_review() -> Command {
    let mut cmd = Command::cargo_bin("logo-review").unwrap();
    for var in [
        "ROBOTOFF_API_URL",
        "OFF_IMAGES_URL",
        "LOGO_REVIEW_TIMEOUT_SECS",
        "LOGO_REVIEW_MAX_RETRIES",
        "LOGO_REVIEW_ALLOW_HTTP",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    logo_review()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Search visually similar logos"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("annotate"))
        .stdout(predicate::str::contains("link"));
}

#[test]
fn test_version_displays_version() {
    logo_review()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("logo-review"));
}

#[test]
fn test_help_shows_exit_codes() {
    logo_review()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("64"))
        .stdout(predicate::str::contains("69"));
}

#[test]
fn test_annotate_help_shows_options() {
    logo_review()
        .args(["annotate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--type"))
        .stdout(predicate::str::contains("--select"))
        .stdout(predicate::str::contains("--dry-run"));
}

// ============================================================================
// Search Tests
// ============================================================================

#[test]
fn test_search_lists_reference_first() {
    logo_review()
        .args(["--mock", "search", "--logo-id", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 50 logos"))
        .stdout(predicate::str::contains("Reference logo: 42"))
        .stdout(predicate::str::contains("Link: ?logo_id=42"))
        .stdout(predicate::str::contains("[x]         42"));
}

#[test]
fn test_search_json_output() {
    let stdout = stdout_of(logo_review().args([
        "--mock", "search", "--logo-id", "42", "--count", "20", "--format", "json",
    ]));
    let records: Vec<Value> = serde_json::from_str(&stdout).unwrap();

    assert_eq!(records.len(), 20);
    assert_eq!(records[0]["id"], 42);
    assert_eq!(records[0]["selected"], true);
    assert!(records[1..].iter().all(|r| r["selected"] == false));
    assert!(records[0]["image"]["cropped_image_url"]
        .as_str()
        .unwrap()
        .contains("/images/crop?image_url="));
}

#[test]
fn test_search_from_link() {
    let stdout = stdout_of(logo_review().args([
        "--mock",
        "--quiet",
        "search",
        "--link",
        "?logo_id=500&count=10&utm_source=mail",
    ]));
    assert_eq!(stdout.lines().count(), 10);
    assert!(stdout.lines().next().unwrap().contains(" 500 "));
}

#[test]
fn test_search_widening_stops_at_cap() {
    let output = logo_review()
        .args(["--mock", "search", "--logo-id", "400", "--more", "20", "-q"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(String::from_utf8(output.stdout).unwrap().lines().count(), 500);

    logo_review()
        .args(["--mock", "search", "--logo-id", "400", "--more", "20"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Reached the limit of 500 results"))
        .stdout(predicate::str::contains("Loaded 500 logos"));
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn test_non_numeric_logo_id_is_usage_error() {
    // Exit code 64 = EX_USAGE
    logo_review()
        .args(["--mock", "search", "--logo-id", "abc"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("logo_id must be an integer"));
}

#[test]
fn test_zero_count_is_usage_error() {
    logo_review()
        .args(["--mock", "search", "--logo-id", "1", "--count", "0"])
        .assert()
        .code(64);
}

#[test]
fn test_plain_http_is_config_error() {
    // Exit code 78 = EX_CONFIG
    logo_review()
        .args([
            "--robotoff-url",
            "http://127.0.0.1:9/api/v1",
            "search",
            "--logo-id",
            "1",
        ])
        .assert()
        .code(78)
        .stderr(predicate::str::contains("must use https"));
}

#[test]
fn test_unreachable_service_is_network_error() {
    // Exit code 69 = EX_UNAVAILABLE
    logo_review()
        .env("LOGO_REVIEW_TIMEOUT_SECS", "1")
        .env("LOGO_REVIEW_MAX_RETRIES", "1")
        .args([
            "--allow-http",
            "--robotoff-url",
            "http://127.0.0.1:9/api/v1",
            "search",
            "--logo-id",
            "1",
        ])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Search failed"));
}

#[test]
fn test_allow_http_flag_accepts_env_url() {
    logo_review()
        .env("ROBOTOFF_API_URL", "http://127.0.0.1:9/api/v1")
        .env("LOGO_REVIEW_TIMEOUT_SECS", "1")
        .env("LOGO_REVIEW_MAX_RETRIES", "1")
        .args(["--allow-http", "search", "--logo-id", "1"])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Search failed"));
}

#[test]
fn test_robotoff_url_flag_replaces_env_url() {
    logo_review()
        .env("ROBOTOFF_API_URL", "not a url")
        .env("LOGO_REVIEW_TIMEOUT_SECS", "1")
        .env("LOGO_REVIEW_MAX_RETRIES", "1")
        .args([
            "--allow-http",
            "--robotoff-url",
            "http://127.0.0.1:9/api/v1",
            "search",
            "--logo-id",
            "1",
        ])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Search failed"));
}

#[test]
fn test_link_conflicts_with_count() {
    logo_review()
        .args(["--mock", "search", "--link", "logo_id=42", "--count", "200"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Annotate Tests
// ============================================================================

#[test]
fn test_annotate_selected_neighbors() {
    logo_review()
        .args([
            "--mock", "annotate", "--logo-id", "42", "--type", "brand", "--value", "nutella",
            "--select", "41,43",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Annotated 3 logos as brand=nutella"))
        .stdout(predicate::str::contains("42, 41, 43"));
}

#[test]
fn test_annotate_all() {
    logo_review()
        .args([
            "--mock", "annotate", "--logo-id", "42", "--count", "10", "--type", "label",
            "--value", "en:organic", "--all",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Annotated 10 logos"));
}

#[test]
fn test_annotate_ignores_unloaded_ids() {
    logo_review()
        .args([
            "--mock", "annotate", "--logo-id", "42", "--type", "brand", "--value", "x",
            "--select", "999",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Logo 999 is not among the loaded results"))
        .stdout(predicate::str::contains("Annotated 1 logos"));
}

#[test]
fn test_annotate_dry_run_sends_nothing() {
    logo_review()
        .args([
            "--mock", "annotate", "--logo-id", "42", "--type", "brand", "--value", "x",
            "--select", "43", "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run: 2 annotations not sent"));
}

#[test]
fn test_annotate_without_value_is_skipped() {
    logo_review()
        .args(["--mock", "annotate", "--logo-id", "42", "--type", "brand"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to submit"));
}

#[test]
fn test_select_conflicts_with_all() {
    logo_review()
        .args([
            "--mock", "annotate", "--logo-id", "42", "--select", "43", "--all",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Link Tests
// ============================================================================

#[test]
fn test_link_encode_elides_defaults() {
    logo_review()
        .args(["link", "encode", "--logo-id", "42", "--count", "100"])
        .assert()
        .success()
        .stdout("count=100&logo_id=42\n");

    logo_review()
        .args(["link", "encode", "--logo-id", "42"])
        .assert()
        .success()
        .stdout("logo_id=42\n");
}

#[test]
fn test_link_decode_falls_back_to_defaults() {
    logo_review()
        .args(["link", "decode", "?logo_id=7&count=abc&foo=bar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("logo_id: 7"))
        .stdout(predicate::str::contains("index:   -"))
        .stdout(predicate::str::contains("count:   50"));
}

#[test]
fn test_link_decode_json() {
    let stdout = stdout_of(logo_review().args([
        "link",
        "decode",
        "index=efficientnet&count=200",
        "--format",
        "json",
    ]));
    let params: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(params["index"], "efficientnet");
    assert_eq!(params["count"], 200);
    assert!(params["logo_id"].is_null());
}
