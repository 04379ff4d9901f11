// ABOUTME: Integration tests for the preview CLI binary.
// ABOUTME: Covers HTML file extraction, multiple fetched URLs, error exit codes and usage errors.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn preview_cmd() -> Command {
    Command::cargo_bin("preview").unwrap()
}

#[test]
fn extract_from_html_file() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = temp_dir.path().join("test.html");

    let html_content = r#"<!DOCTYPE html>
<html>
<head><title>Test Page | Example</title><meta name="description" content="Hi there"></head>
<body><p>Hi there</p></body>
</html>"#;
    fs::write(&html_path, html_content).unwrap();

    preview_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("--url")
        .arg("https://example.com")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title": "Test Page""#))
        .stdout(predicate::str::contains(r#""contentType": "default""#));
}

#[test]
fn writes_compact_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = temp_dir.path().join("video.html");
    let out_path = temp_dir.path().join("out.json");
    fs::write(&html_path, "<html><head><title>Clip</title></head><body></body></html>").unwrap();

    preview_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("--url")
        .arg("https://www.youtube.com/watch?v=abc123XYZ90")
        .arg("--compact")
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    let written = fs::read_to_string(&out_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["contentType"], "video");
    assert_eq!(value["embedUrl"], "https://www.youtube.com/embed/abc123XYZ90");
    assert!(!written.trim().contains('\n'));
}

#[test]
fn multiple_urls_output_array() {
    let server = MockServer::start();

    let mock1 = server.mock(|when, then| {
        when.method(GET).path("/page1");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body("<html><head><title>Page One</title></head><body><p>One</p></body></html>");
    });
    let mock2 = server.mock(|when, then| {
        when.method(GET).path("/page2");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body("<html><head><title>Page Two</title></head><body><p>Two</p></body></html>");
    });

    let output = preview_cmd()
        .arg("--allow-private-networks")
        .arg(server.url("/page1"))
        .arg(server.url("/page2"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    mock1.assert();
    mock2.assert();

    let records: Vec<serde_json::Value> = serde_json::from_slice(&output).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["title"], "Page One");
    assert_eq!(records[1]["title"], "Page Two");
}

#[test]
fn fetch_failure_prints_error_record_and_exits_one() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404);
    });

    preview_cmd()
        .arg("--allow-private-networks")
        .arg(server.url("/missing"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""contentType": "error""#))
        .stdout(predicate::str::contains(r#""category": "notFound""#));
}

#[test]
fn private_network_blocked_by_default() {
    let server = MockServer::start();

    preview_cmd()
        .arg(server.url("/anything"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""category": "blocked""#));
}

#[test]
fn html_without_url_is_usage_error() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = temp_dir.path().join("x.html");
    fs::write(&html_path, "<p>x</p>").unwrap();

    preview_cmd()
        .arg("--html")
        .arg(&html_path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--url is required"));
}

#[test]
fn no_input_is_usage_error() {
    preview_cmd().assert().code(2);
}
