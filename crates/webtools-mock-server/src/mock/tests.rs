//! Tests for the mock module.
//!
//! These drive a real `MockServerManager` over loopback sockets:
//! - start/stop/update lifecycle and the single-listener invariant
//! - dispatch over the wire (JSON, raw text, 404 listing, CORS)
//! - delay isolation between concurrent requests
//! - request log recording

use super::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn free_port() -> u16 {
    port_check::free_local_port().expect("no free local port")
}

fn manager() -> MockServerManager {
    MockServerManager::new(MockSettings::default())
}

/// Client without connection pooling, so each request sees the current listener
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

fn url(port: u16, path: &str) -> String {
    format!("http://127.0.0.1:{port}{path}")
}

async fn port_accepts_connections(port: u16) -> bool {
    tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .is_ok()
}

fn users_rule() -> EndpointRule {
    EndpointRule::new("GET", "/api/users", 200, r#"{"users":[]}"#)
}

#[tokio::test]
async fn test_initial_status_is_stopped_with_seed() {
    let manager = manager();
    let status = manager.status().await;
    assert!(!status.is_running);
    assert_eq!(status.port, 3001);
    assert_eq!(status.endpoint_count, 2);
    assert!(status.started_at.is_none());
}

#[tokio::test]
async fn test_start_serves_matching_and_unmatched_requests() {
    let manager = manager();
    let port = free_port();

    let bound = manager.start(port, Some(vec![users_rule()])).await.unwrap();
    assert_eq!(bound, port);

    let client = client();
    let resp = client.get(url(port, "/api/users")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), r#"{"users":[]}"#);

    let resp = client.get(url(port, "/api/other")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["availableEndpoints"], serde_json::json!(["GET /api/users"]));
    assert_eq!(body["path"], "/api/other");
    assert_eq!(body["method"], "GET");

    manager.stop().await;
}

#[tokio::test]
async fn test_json_and_text_round_trip() {
    let manager = manager();
    let port = free_port();
    manager
        .start(
            port,
            Some(vec![
                EndpointRule::new("GET", "/json", 200, r#"{"a":1}"#),
                EndpointRule::new("GET", "/text", 200, "plain text"),
            ]),
        )
        .await
        .unwrap();

    let client = client();
    let resp = client.get(url(port, "/json")).send().await.unwrap();
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"a": 1}));

    let resp = client.get(url(port, "/text")).send().await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "plain text");

    manager.stop().await;
}

#[tokio::test]
async fn test_restart_on_same_port_serves_new_endpoints() {
    let manager = manager();
    let port = free_port();

    manager.start(port, Some(vec![users_rule()])).await.unwrap();
    manager
        .start(
            port,
            Some(vec![EndpointRule::new("GET", "/api/orders", 200, r#"{"orders":[]}"#)]),
        )
        .await
        .unwrap();

    let status = manager.status().await;
    assert!(status.is_running);
    assert_eq!(status.port, port);
    assert_eq!(status.endpoint_count, 1);

    let client = client();
    let resp = client.get(url(port, "/api/orders")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = client.get(url(port, "/api/users")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    manager.stop().await;
    assert!(!port_accepts_connections(port).await);
}

#[tokio::test]
async fn test_start_without_endpoints_keeps_snapshot() {
    let manager = manager();
    let port = free_port();

    manager.start(port, None).await.unwrap();
    let resp = client()
        .post(url(port, "/api/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"id": 1, "created": true}));

    manager.stop().await;
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let manager = manager();
    let port = free_port();
    manager.start(port, None).await.unwrap();

    assert!(manager.stop().await);
    assert!(!manager.status().await.is_running);
    assert!(!manager.stop().await);
    assert!(!manager.status().await.is_running);
    assert!(!port_accepts_connections(port).await);
}

#[tokio::test]
async fn test_stop_when_never_started() {
    let manager = manager();
    assert!(!manager.stop().await);
    assert!(!manager.status().await.is_running);
}

#[tokio::test]
async fn test_update_while_stopped_does_not_bind() {
    let manager = manager();

    let outcome = manager
        .update_endpoints(vec![users_rule(), EndpointRule::new("DELETE", "/x", 204, "")])
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RestartOutcome {
            count: 2,
            restarted: false
        }
    );

    let status = manager.status().await;
    assert!(!status.is_running);
    assert_eq!(status.endpoint_count, 2);
    assert_eq!(manager.endpoints().await[1].route_key(), "DELETE /x");
}

#[tokio::test]
async fn test_update_while_running_rebinds_same_port() {
    let manager = manager();
    let port = free_port();
    manager.start(port, Some(vec![users_rule()])).await.unwrap();

    let outcome = manager
        .update_endpoints(vec![EndpointRule::new("PUT", "/api/users/1", 200, "updated")])
        .await
        .unwrap();
    assert!(outcome.restarted);
    assert_eq!(outcome.count, 1);

    let status = manager.status().await;
    assert!(status.is_running);
    assert_eq!(status.port, port);

    let client = client();
    let resp = client.put(url(port, "/api/users/1")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "updated");
    let resp = client.get(url(port, "/api/users")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    manager.stop().await;
}

#[tokio::test]
async fn test_invalid_update_leaves_state_untouched() {
    let manager = manager();
    let port = free_port();
    manager.start(port, Some(vec![users_rule()])).await.unwrap();

    let err = manager
        .update_endpoints(vec![EndpointRule::new("GET", "no-slash", 200, "")])
        .await
        .unwrap_err();
    assert!(matches!(err, MockError::InvalidEndpoint { index: 0, .. }));

    let status = manager.status().await;
    assert!(status.is_running);
    assert_eq!(status.endpoint_count, 1);

    manager.stop().await;
}

#[tokio::test]
async fn test_start_on_occupied_port_reports_port_in_use() {
    let squatter = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = squatter.local_addr().unwrap().port();

    let manager = manager();
    let err = manager.start(port, None).await.unwrap_err();
    assert_eq!(err, MockError::PortInUse(port));
    assert_eq!(err.to_string(), format!("Port {port} is already in use"));
    assert!(!manager.status().await.is_running);
}

#[tokio::test]
async fn test_failed_start_after_running_leaves_manager_stopped() {
    let manager = manager();
    let first = free_port();
    manager.start(first, None).await.unwrap();

    let squatter = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let occupied = squatter.local_addr().unwrap().port();

    let err = manager.start(occupied, None).await.unwrap_err();
    assert_eq!(err, MockError::PortInUse(occupied));
    assert!(!manager.status().await.is_running);
    // the previous listener was released, not leaked
    assert!(!port_accepts_connections(first).await);
}

/// Never assigned to a local interface, so binding it always fails
const UNASSIGNABLE_HOST: &str = "192.0.2.1";

#[tokio::test]
async fn test_start_on_unassignable_host_reports_listener_error() {
    let manager = MockServerManager::new(MockSettings {
        host: UNASSIGNABLE_HOST.to_string(),
        ..MockSettings::default()
    });
    let port = free_port();

    let err = manager.start(port, None).await.unwrap_err();
    assert!(matches!(err, MockError::ListenerError { port: p, .. } if p == port));
    assert!(err.to_string().starts_with(&format!("Failed to bind port {port}")));
    assert!(!manager.status().await.is_running);
}

#[tokio::test]
async fn test_failed_restart_during_update_leaves_manager_stopped() {
    let manager = manager();
    let port = free_port();
    manager.start(port, Some(vec![users_rule()])).await.unwrap();

    manager.set_bind_host(UNASSIGNABLE_HOST).await;
    let err = manager
        .update_endpoints(vec![EndpointRule::new("GET", "/v2", 200, "v2")])
        .await
        .unwrap_err();
    assert!(matches!(err, MockError::ListenerError { .. }));

    let status = manager.status().await;
    assert!(!status.is_running);
    // the new snapshot is kept for the next start
    assert_eq!(status.endpoint_count, 1);
    assert_eq!(manager.endpoints().await[0].path, "/v2");
    assert!(!port_accepts_connections(port).await);
}

#[tokio::test]
async fn test_start_rejects_port_zero() {
    let manager = manager();
    assert_eq!(
        manager.start(0, None).await.unwrap_err(),
        MockError::InvalidPort(0)
    );
}

#[tokio::test]
async fn test_delay_does_not_block_concurrent_request() {
    let manager = manager();
    let port = free_port();
    manager
        .start(
            port,
            Some(vec![
                EndpointRule::new("GET", "/slow", 200, r#"{"slow":true}"#).with_delay(250),
                EndpointRule::new("GET", "/fast", 200, r#"{"fast":true}"#),
            ]),
        )
        .await
        .unwrap();

    let client = client();
    let started = Instant::now();
    let slow = async {
        let resp = client.get(url(port, "/slow")).send().await.unwrap();
        let _ = resp.bytes().await.unwrap();
        started.elapsed()
    };
    let fast = async {
        // let the slow request reach the listener first
        tokio::time::sleep(Duration::from_millis(20)).await;
        let resp = client.get(url(port, "/fast")).send().await.unwrap();
        let _ = resp.bytes().await.unwrap();
        started.elapsed()
    };

    let (slow_elapsed, fast_elapsed) = tokio::join!(slow, fast);
    assert!(slow_elapsed >= Duration::from_millis(250));
    assert!(fast_elapsed < slow_elapsed);
    assert!(fast_elapsed < Duration::from_millis(250));

    manager.stop().await;
}

#[tokio::test]
async fn test_stop_during_delay_does_not_crash() {
    let manager = Arc::new(manager());
    let port = free_port();
    manager
        .start(
            port,
            Some(vec![EndpointRule::new("GET", "/slow", 200, "late").with_delay(200)]),
        )
        .await
        .unwrap();

    let request = tokio::spawn(async move { client().get(url(port, "/slow")).send().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stop_started = Instant::now();
    manager.stop().await;
    // stop() does not wait for the delayed response
    assert!(stop_started.elapsed() < Duration::from_millis(150));
    assert!(!manager.status().await.is_running);

    // the in-flight request either completes or fails cleanly
    let _ = request.await.unwrap();
}

#[tokio::test]
async fn test_cors_headers_on_mock_responses() {
    let manager = manager();
    let port = free_port();
    manager.start(port, Some(vec![users_rule()])).await.unwrap();

    let client = client();
    let resp = client
        .get(url(port, "/api/users"))
        .header("Origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    let resp = client
        .request(reqwest::Method::OPTIONS, url(port, "/api/users"))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert!(resp
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("POST"));
    // only the GET is dispatched and logged
    assert_eq!(manager.request_log().len(), 1);

    manager.stop().await;
}

#[tokio::test]
async fn test_requests_are_logged() {
    let manager = manager();
    let port = free_port();
    manager.start(port, Some(vec![users_rule()])).await.unwrap();

    let client = client();
    client.get(url(port, "/api/users")).send().await.unwrap();
    client
        .post(url(port, "/api/missing"))
        .json(&serde_json::json!({"name": "Ada"}))
        .send()
        .await
        .unwrap();

    let entries = manager.request_log().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, "/api/users");
    assert_eq!(entries[0].status, 200);
    assert_eq!(entries[1].method, "POST");
    assert_eq!(entries[1].status, 404);
    assert_eq!(entries[1].body, Some(serde_json::json!({"name": "Ada"})));

    manager.stop().await;
}

#[tokio::test]
async fn test_concurrent_lifecycle_calls_stay_consistent() {
    let manager = Arc::new(manager());
    let port = free_port();

    let mut tasks = Vec::new();
    for i in 0..12 {
        let manager = Arc::clone(&manager);
        tasks.push(tokio::spawn(async move {
            match i % 3 {
                0 => {
                    let _ = manager.start(port, None).await;
                }
                1 => {
                    manager.stop().await;
                }
                _ => {
                    let _ = manager.update_endpoints(vec![users_rule()]).await;
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let status = manager.status().await;
    assert_eq!(status.is_running, port_accepts_connections(port).await);

    manager.shutdown().await;
    assert!(!manager.status().await.is_running);
    assert!(!port_accepts_connections(port).await);
}
