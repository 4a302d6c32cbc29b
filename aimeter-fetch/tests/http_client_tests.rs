//! HTTP client integration tests against a local mock server.

use aimeter_fetch::{CancellationToken, FetchError, HttpClient, USER_AGENT};
use httpmock::prelude::*;
use reqwest::header::HeaderMap;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_get_sends_bearer_and_user_agent() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/usage")
            .header("authorization", "Bearer tok")
            .header("user-agent", USER_AGENT);
        then.status(200).json_body(json!({"ok": true}));
    });

    let client = HttpClient::new().unwrap();
    let headers = HttpClient::bearer_headers("tok").unwrap();
    let response = client
        .get(&server.url("/usage"), headers, &CancellationToken::new())
        .await
        .unwrap();

    mock.assert();
    assert!(response.is_success());
    let value: serde_json::Value = response.json().unwrap();
    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_post_form_and_status_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/token")
            .header("content-type", "application/x-www-form-urlencoded")
            .body_includes("grant_type=refresh_token");
        then.status(400).body(r#"{"error":"invalid_grant"}"#);
    });

    let client = HttpClient::new().unwrap();
    let response = client
        .post_form(
            &server.url("/token"),
            HeaderMap::new(),
            &[("grant_type", "refresh_token")],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    mock.assert();
    let err = response.error_for_status().unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("invalid_grant"));
}

#[tokio::test]
async fn test_cancellation_interrupts_slow_request() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200).delay(Duration::from_secs(5)).body("{}");
    });

    let client = HttpClient::new().unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client
        .get(&server.url("/slow"), HeaderMap::new(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Cancelled));
}

#[tokio::test]
async fn test_client_timeout_maps_to_timeout() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200).delay(Duration::from_secs(3)).body("{}");
    });

    let client = HttpClient::with_timeout(Duration::from_millis(100)).unwrap();
    let err = client
        .get(&server.url("/slow"), HeaderMap::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout));
}
