//! Tests for the HTTP transport module

use super::*;
use crate::error::Error;
use crate::types::Session;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, token: &str) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(format!("{}/api/v1", server.uri()))
        .user_agent("test-device/1.0")
        .no_rate_limit()
        .build();
    HttpClient::new(config, Session::new(token)).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.contains("Instagram"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .user_agent("test-agent/1.0")
        .rate_limit(RateLimiterConfig::new(5, 5))
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.user_agent, "test-agent/1.0");
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::new(5, 5)));
}

#[test]
fn test_request_config_query_opt() {
    let config = RequestConfig::new()
        .query("can_support_threading", "true")
        .query_opt("min_id", Some("abc"))
        .query_opt("max_id", None);

    assert_eq!(config.query.get("min_id"), Some(&"abc".to_string()));
    assert!(!config.query.contains_key("max_id"));
    assert_eq!(config.query.len(), 2);
}

#[tokio::test]
async fn test_request_sends_identity_and_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/media/42/comments/"))
        .and(header("user-agent", "test-device/1.0"))
        .and(header("cookie", "sessionid=s3cr3t"))
        .and(query_param("max_id", "cursor-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "comments": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "s3cr3t");
    let body = client
        .request(
            "media/42/comments/",
            RequestConfig::new().query("max_id", "cursor-1"),
        )
        .await
        .unwrap();

    assert!(body["comments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_status_classification() {
    let mock_server = MockServer::start().await;

    for (route, status) in [("/api/v1/forbidden", 403_u16), ("/api/v1/expired", 401)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/v1/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/broken"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/teapot"))
        .respond_with(ResponseTemplate::new(418).set_body_string("short and stout"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "token");
    let client = &client;
    let get = move |p: &'static str| async move { client.request(p, RequestConfig::new()).await };

    assert!(matches!(get("forbidden").await, Err(Error::Unauthorized { .. })));
    assert!(matches!(get("expired").await, Err(Error::Unauthorized { .. })));
    assert!(matches!(
        get("limited").await,
        Err(Error::RateLimited {
            retry_after_seconds: Some(7)
        })
    ));
    assert!(matches!(
        get("broken").await,
        Err(Error::ServerError { status: 502 })
    ));
    assert!(matches!(get("missing").await, Err(Error::NotFound { .. })));
    match get("teapot").await {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 418);
            assert_eq!(body, "short and stout");
        }
        other => panic!("Expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_internal_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "token");
    let result = client.request("flaky", RequestConfig::new()).await;

    assert!(matches!(result, Err(Error::ServerError { status: 500 })));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "token");
    let result = client.request("html", RequestConfig::new()).await;

    assert!(matches!(result, Err(Error::MalformedResponse { .. })));
}

#[tokio::test]
async fn test_network_error_is_classified() {
    let config = HttpClientConfig::builder()
        .base_url("http://127.0.0.1:1")
        .timeout(Duration::from_secs(2))
        .no_rate_limit()
        .build();
    let client = HttpClient::new(config, Session::new("token")).unwrap();

    let err = client.request("anything", RequestConfig::new()).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_validate_session_valid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/current_user/"))
        .and(header("cookie", "sessionid=good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": {"username": "me"}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "good");
    assert!(client.validate_session().await.unwrap());
}

#[tokio::test]
async fn test_validate_session_refusals_are_false() {
    for status in [401_u16, 403, 429, 500] {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/current_user/"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, "bad");
        assert!(
            !client.validate_session().await.unwrap(),
            "status {status} should invalidate the session"
        );
    }
}

#[tokio::test]
async fn test_validate_empty_session_skips_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "   ");
    assert!(!client.validate_session().await.unwrap());
}

#[tokio::test]
async fn test_fetch_text_absolute_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/p/ABC123/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, "token");
    let body = client
        .fetch_text(&format!("{}/p/ABC123/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(body, "<html>hi</html>");
}
