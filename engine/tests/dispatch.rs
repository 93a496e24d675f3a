//! End-to-end tests for the dispatch server and its worker pool

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use hc_engine::{CheckRequest, DispatchServer};

use common::mock_http_server;

fn request_for(addr: SocketAddr) -> CheckRequest {
    CheckRequest {
        protocol: "http".to_string(),
        host: addr.to_string(),
        path: "/".to_string(),
        ..Default::default()
    }
}

fn start_server(workers: u32) -> DispatchServer {
    DispatchServer::start(workers, Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn passing_check_reports_duration() {
    let addr = mock_http_server(200, "OK", &[], "all good").await;
    let server = start_server(2);

    let mut request = request_for(addr);
    request.expected_status_codes = vec![200];
    request.expected_body = "good".to_string();

    let response = server.submit(request).await;
    assert!(response.success, "unexpected failure: {}", response.message);
    assert!(response.message.starts_with("Request took "));
    assert!(response.debug_message.is_empty());
}

#[tokio::test]
async fn failing_check_reports_first_assertion_error() {
    let addr = mock_http_server(404, "Not Found", &[], "nope").await;
    let server = start_server(2);

    let mut request = request_for(addr);
    request.expected_status_codes = vec![200];
    request.expected_body = "nope".to_string();

    let response = server.submit(request).await;
    assert!(!response.success);
    assert_eq!(
        response.message,
        "Unexpected status code: 404 Not Found (expected: [200])"
    );
}

#[tokio::test]
async fn empty_status_set_applies_no_status_assertion() {
    // no expected codes at all: a 404 must still pass
    let addr = mock_http_server(404, "Not Found", &[], "").await;
    let server = start_server(1);

    let response = server.submit(request_for(addr)).await;
    assert!(response.success, "unexpected failure: {}", response.message);
}

#[tokio::test]
async fn debug_flag_returns_a_transcript() {
    let addr = mock_http_server(200, "OK", &[("X-Served-By", "mock")], "").await;
    let server = start_server(1);

    let mut request = request_for(addr);
    request.debug = true;

    let response = server.submit(request).await;
    assert!(response.success);
    assert!(response.debug_message.contains("Status: 200 OK"));
    assert!(response.debug_message.contains("x-served-by: mock"));
}

#[tokio::test]
async fn unreachable_target_fails_with_transport_error() {
    // a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let server = start_server(1);
    let response = server.submit(request_for(addr)).await;
    assert!(!response.success);
    assert!(!response.message.is_empty());
}

#[tokio::test]
async fn single_worker_serializes_many_submissions() {
    let addr = mock_http_server(200, "OK", &[], "ok").await;
    let server = std::sync::Arc::new(start_server(1));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let server = std::sync::Arc::clone(&server);
        let mut request = request_for(addr);
        request.expected_status_codes = vec![200];
        handles.push(tokio::spawn(async move { server.submit(request).await }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert!(response.success, "unexpected failure: {}", response.message);
    }
}

#[tokio::test]
async fn pool_answers_parallel_callers() {
    let addr = mock_http_server(200, "OK", &[], "ok").await;
    let server = std::sync::Arc::new(start_server(8));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let server = std::sync::Arc::clone(&server);
        let request = request_for(addr);
        handles.push(tokio::spawn(async move { server.submit(request).await }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert!(response.success, "unexpected failure: {}", response.message);
    }
}
