//! Integration tests for the `deskly` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without a backend; the rest drive the binary against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `deskly` binary with env isolation.
///
/// Clears all `DESKLY_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn deskly_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("deskly");
    cmd.env("HOME", "/tmp/deskly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/deskly-cli-test-nonexistent")
        .env("DESKLY_CONFIG", "/tmp/deskly-cli-test-nonexistent/config.toml")
        .env("NO_COLOR", "1")
        .env_remove("DESKLY_PROFILE")
        .env_remove("DESKLY_API_URL")
        .env_remove("DESKLY_TOKEN")
        .env_remove("DESKLY_OUTPUT")
        .env_remove("DESKLY_INSECURE")
        .env_remove("DESKLY_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Same as [`deskly_cmd`], aimed at a mock backend.
fn deskly_at(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = deskly_cmd();
    cmd.args(["--api-url", &format!("{}/api", server.uri())]);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn blog_posts(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            json!({
                "_id": format!("b{i}"),
                "title": format!("Post {i:02}"),
                "status": if i % 2 == 0 { "published" } else { "draft" },
                "createdAt": format!("2024-03-{i:02}T09:00:00Z"),
            })
        })
        .collect()
}

async fn mount_blogs(server: &MockServer, n: usize) {
    Mock::given(method("GET"))
        .and(path("/api/blogs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": blog_posts(n),
            "total": n,
            "page": 1,
            "limit": 100,
            "totalPages": 1,
            "hasNextPage": false,
            "hasPrevPage": false
        })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = deskly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_content_types() {
    deskly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("blogs")
            .and(predicate::str::contains("newsletter-subscribers"))
            .and(predicate::str::contains("contact-requests"))
            .and(predicate::str::contains("upload")),
    );
}

#[test]
fn test_entity_help_lists_operations() {
    deskly_cmd().args(["products", "--help"]).assert().success().stdout(
        predicate::str::contains("list")
            .and(predicate::str::contains("get"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("delete")),
    );
}

#[test]
fn test_version_flag() {
    deskly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("deskly"));
}

#[test]
fn test_completions_zsh() {
    deskly_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_env() {
    deskly_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "/tmp/deskly-cli-test-nonexistent/config.toml",
        ));
}

#[test]
fn test_config_set_then_show_masks_token() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    for (key, value) in [("api_url", "https://cms.example.com/api"), ("token", "s3cret")] {
        deskly_cmd()
            .env("DESKLY_CONFIG", &config)
            .args(["config", "set", key, value])
            .assert()
            .success();
    }

    deskly_cmd()
        .env("DESKLY_CONFIG", &config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://cms.example.com/api")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("s3cret").not()),
        );
}

#[test]
fn test_unknown_profile_is_an_error() {
    let output = deskly_cmd()
        .args(["--profile", "nope", "blogs", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("nope"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = deskly_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_create_requires_payload() {
    let output = deskly_cmd().args(["blogs", "create"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_backend_unreachable_exit_code() {
    let output = deskly_cmd()
        .args(["--api-url", "http://127.0.0.1:9/api", "--timeout", "2"])
        .args(["faqs", "list"])
        .output()
        .unwrap();
    let code = output.status.code();
    assert!(
        code == Some(7) || code == Some(8),
        "Expected connection/timeout exit code, got {code:?}:\n{}",
        combined_output(&output)
    );
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_json_pages_locally() {
    let server = MockServer::start().await;
    mount_blogs(&server, 12).await;

    let output = deskly_at(&server)
        .args(["-o", "json", "blogs", "list", "--page", "2", "-n", "5"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    // Newest first by default: b12..b8 on page 1, b7..b3 on page 2.
    assert_eq!(items[0]["id"], "b7");
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["hasNextPage"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_filter_search_and_plain_output() {
    let server = MockServer::start().await;
    mount_blogs(&server, 6).await;

    let output = deskly_at(&server)
        .args(["-o", "plain", "blogs", "list", "-f", "status=published"])
        .args(["--sort", "title", "--all"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "b2\nb4\nb6");

    let output = deskly_at(&server)
        .args(["-o", "plain", "blogs", "list", "--search", "post 03"])
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "b3");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_table_shows_page_footer() {
    let server = MockServer::start().await;
    mount_blogs(&server, 3).await;

    deskly_at(&server)
        .args(["blogs", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Title").and(predicate::str::contains("Post 03")))
        .stderr(predicate::str::contains("Page 1/1 · 3 total"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_filter_is_a_usage_error() {
    let server = MockServer::start().await;
    mount_blogs(&server, 1).await;

    let output = deskly_at(&server)
        .args(["blogs", "list", "-f", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_missing_record_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Service not found",
            "statusCode": 404
        })))
        .mount(&server)
        .await;

    let output = deskly_at(&server)
        .args(["services", "get", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("services list"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_token_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/contact"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid or expired token",
            "error": "Unauthorized",
            "statusCode": 401
        })))
        .mount(&server)
        .await;

    let output = deskly_at(&server)
        .args(["--token", "stale", "contact-requests", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Session expired"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_change_prints_record() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/testimonials/t1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "_id": "t1", "name": "Grace", "status": "approved" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = deskly_at(&server)
        .args(["-o", "json", "testimonials", "status", "t1", "approved"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["status"], "approved");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_status_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = deskly_at(&server)
        .args(["testimonials", "status", "t1", "published"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("must be one of"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bulk_delete_reports_partial_failure() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/faqs/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/faqs/f2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Internal server error",
            "statusCode": 500
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/faqs/f3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = deskly_at(&server)
        .args(["--yes", "faqs", "delete", "f1", "f2", "f3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("Deleted 1 of 3"), "{text}");
    assert!(text.contains("f3"), "{text}");
}

#[test]
fn test_delete_without_yes_needs_terminal() {
    let output = deskly_cmd()
        .args(["--api-url", "http://127.0.0.1:9/api", "faqs", "delete", "f1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}
