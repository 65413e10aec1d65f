//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: credential store → post resolution →
//! session probe → paged comment requests → CSV output

use comment_harvest::credentials::CredentialStore;
use comment_harvest::engine::{HarvestJob, Harvester, JobStatus};
use comment_harvest::{ErrorKind, HarvestConfig, Session};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POST_BODY: &str = r#"<html><head><script type="application/json">{"media_id":"987654321","x":1}</script></head></html>"#;

async fn mount_post_and_probe(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/p/Cx-1_a/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(POST_BODY))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/current_user/"))
        .and(header("cookie", format!("sessionid={token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": {}})))
        .mount(server)
        .await;
}

fn write_config(dir: &std::path::Path, server: &MockServer) -> std::path::PathBuf {
    let config_path = dir.join("harvest.json");
    let config = json!({
        "api": {
            "base_url": format!("{}/api/v1", server.uri()),
            "user_agent": "integration-agent/1.0",
            "page_size_hint": 2
        },
        "pacing": {"page_delay_ms": 1, "max_delay_ms": 10, "tick_ms": 1, "max_retries": 2},
        "rate_limit": {"enabled": false},
        "output": {"results_dir": dir.join("results")}
    });
    std::fs::write(&config_path, config.to_string()).unwrap();
    config_path
}

// ============================================================================
// End-to-End Harvest
// ============================================================================

#[tokio::test]
async fn test_harvest_from_stored_session_to_csv() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    mount_post_and_probe(&server, "stored-token").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/media/987654321/comments/"))
        .and(header("user-agent", "integration-agent/1.0"))
        .and(query_param("can_support_threading", "true"))
        .and(query_param("permalink_enabled", "false"))
        .and(query_param("count", "2"))
        .and(query_param_is_missing("max_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "comment_count": 3,
            "caption": {"user": {"username": "poster"}},
            "has_more_comments": true,
            "next_max_id": "{\"cached_comments_cursor\":\"2\"}",
            "comments": [
                {"pk": "1", "user": {"username": "ann", "full_name": "Ann, Jr."},
                 "text": "first, with a comma", "created_at_utc": 1700000001, "comment_like_count": 4},
                {"pk": 2, "user": {"username": "bo"},
                 "text": "line one\nline two", "created_at_utc": 1700000002}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/media/987654321/comments/"))
        .and(query_param("max_id", "{\"cached_comments_cursor\":\"2\"}"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "comment_count": 3,
            "has_more_comments": false,
            "comments": [
                {"pk": "3", "user": {"username": "cy", "full_name": "Cy"},
                 "text": "say \"hi\"", "created_at_utc": 1700000003, "comment_like_count": 0}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = CredentialStore::new(dir.path().join(".env"));
    store.save(&Session::new("stored-token")).await.unwrap();
    let session = store.load().unwrap().unwrap();

    let config = HarvestConfig::from_file(write_config(dir.path(), &server)).unwrap();
    let job = HarvestJob::new(&format!("{}/p/Cx-1_a/", server.uri()), 100, session).unwrap();
    let report = Harvester::new(config).run(job).await;

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.records_written(), 3);
    assert_eq!(report.effective_limit, 3);

    let output = report.output_path.unwrap();
    let name = output.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("poster_Cx-1_a_comments_"), "{name}");
    assert!(output.starts_with(dir.path().join("results")));

    let contents = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        contents,
        concat!(
            "comment_id,media_id,username,full_name,comment_text,created_at,likes_count\r\n",
            "1,987654321,ann,\"Ann, Jr.\",\"first, with a comma\",1700000001,4\r\n",
            "2,987654321,bo,,\"line one\nline two\",1700000002,0\r\n",
            "3,987654321,cy,Cy,\"say \"\"hi\"\"\",1700000003,0\r\n",
        )
    );
}

#[tokio::test]
async fn test_expired_session_aborts_cleanly() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    mount_post_and_probe(&server, "good-token").await;

    // Any other cookie falls through to the refusal
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/current_user/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let config = HarvestConfig::from_file(write_config(dir.path(), &server)).unwrap();
    let job = HarvestJob::new(
        &format!("{}/p/Cx-1_a/", server.uri()),
        10,
        Session::new("expired-token"),
    )
    .unwrap();
    let report = Harvester::new(config).run(job).await;

    assert_eq!(report.status, JobStatus::Aborted);
    assert_eq!(report.error_kind(), Some(ErrorKind::Unauthorized));
    assert_eq!(report.records_written(), 0);
    assert!(report.output_path.is_none());
    assert!(!dir.path().join("results").exists());
}

#[tokio::test]
async fn test_unknown_owner_when_caption_missing() {
    let server = MockServer::start().await;
    let dir = tempdir().unwrap();
    mount_post_and_probe(&server, "tok").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/media/987654321/comments/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "comments": [{"pk": 9, "text": "anon", "created_at_utc": 1}]
        })))
        .mount(&server)
        .await;

    let config = HarvestConfig::from_file(write_config(dir.path(), &server)).unwrap();
    let job = HarvestJob::new(&format!("{}/p/Cx-1_a/", server.uri()), 5, Session::new("tok"))
        .unwrap();
    let report = Harvester::new(config).run(job).await;

    assert_eq!(report.status, JobStatus::Completed);
    let name = report
        .output_path
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap();
    assert!(name.starts_with("unknown_Cx-1_a_comments_"), "{name}");
}
