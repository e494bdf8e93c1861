use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::json;
use std::process::{Command, Output};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Integration tests for the github-digest binary
// These run the built executable with a scrubbed environment

const SECRETS_ENV: &str = r#"EMAIL_ADDRESS=me@example.com
EMAIL_USERNAME="Digest Bot"
EMAIL_PASSWORD=secret
GH_TOKEN=test-token
"#;

fn digest_command() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_github-digest"));
    cmd.env_clear();
    cmd
}

/// Write a config file whose env file lives next to it.
fn write_config(dir: &TempDir, extra: &str) -> std::path::PathBuf {
    let env_file = dir.child(".env");
    let config = dir.child("config.yml");
    config
        .write_str(&format!(
            "keyword: msgspec\nenv_file: \"{}\"\n{extra}",
            env_file.path().display()
        ))
        .unwrap();
    config.path().to_path_buf()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_cli_help() {
    let output = digest_command().arg("--help").output().unwrap();

    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.contains("--no-email"));
    assert!(help.contains("--config"));
    assert!(help.contains("--date"));
}

#[test]
fn test_cli_version() {
    let output = digest_command().arg("--version").output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("github-digest"));
}

#[test]
fn test_invalid_date_is_rejected() {
    let output = digest_command()
        .args(["--date", "05/02/2024"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("--date"));
}

#[test]
fn test_missing_secret_names_variable() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, "");

    let output = digest_command()
        .arg("--config")
        .arg(&config)
        .arg("--no-email")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("EMAIL_ADDRESS environment variable not set"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_env_file_fills_in_secrets() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, "");
    temp_dir
        .child(".env")
        .write_str("EMAIL_ADDRESS=me@example.com\nEMAIL_USERNAME=Me\nEMAIL_PASSWORD=pw\n")
        .unwrap();

    let output = digest_command()
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("GH_TOKEN environment variable not set"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.child("config.yml");
    config.write_str("keyword: \"\"\n").unwrap();

    let output = digest_command()
        .arg("--config")
        .arg(config.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let reported = predicate::str::contains("Failed to")
        .not()
        .and(predicate::str::contains("keyword must not be empty"));
    assert!(reported.eval(&stderr(&output)));
}

fn empty_search() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": {
            "search": {
                "pageInfo": { "hasNextPage": false, "endCursor": null },
                "items": []
            }
        }
    }))
}

async fn mount_empty_commit_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 0,
            "incomplete_results": false,
            "items": []
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_email_prints_digest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("type: ISSUE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "search": {
                    "pageInfo": { "hasNextPage": false, "endCursor": null },
                    "items": [{
                        "type": "Issue",
                        "author": { "type": "User", "login": "alice" },
                        "url": "https://github.com/a/b/issues/1",
                        "createdAt": "2024-05-01T15:00:00Z",
                        "lastEditedAt": null,
                        "closedAt": null,
                        "repo": { "nameWithOwner": "a/b", "url": "https://github.com/a/b" },
                        "number": 1,
                        "title": "Fix bug",
                        "state": "OPEN",
                        "comments": { "items": [], "totalCount": 0 }
                    }]
                }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("type: DISCUSSION"))
        .respond_with(empty_search())
        .mount(&server)
        .await;
    mount_empty_commit_search(&server).await;

    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, &format!("github:\n  api_url: \"{}\"\n", server.uri()));
    temp_dir.child(".env").write_str(SECRETS_ENV).unwrap();

    let output = digest_command()
        .arg("--config")
        .arg(&config)
        .args(["--no-email", "--date", "2024-05-02"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "**a/b**\n- Issue #1: Fix bug <https://github.com/a/b/issues/1>\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_digest_prints_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(empty_search())
        .expect(2)
        .mount(&server)
        .await;
    mount_empty_commit_search(&server).await;

    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, &format!("github:\n  api_url: \"{}\"\n", server.uri()));
    temp_dir.child(".env").write_str(SECRETS_ENV).unwrap();

    // Email stays enabled: an empty digest must not reach the SMTP step.
    let output = digest_command()
        .arg("--config")
        .arg(&config)
        .args(["--date", "2024-05-02"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
}
