// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Auth Matrix Integration Tests
 * Cross-session probes against a mock API
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::sync::Arc;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use idorplus_scanner::config::Config;
use idorplus_scanner::detector::AuthMatrixTester;
use idorplus_scanner::http_client::{HttpMethod, SmartClient};
use idorplus_scanner::proxy::ProxyManager;
use idorplus_scanner::session::SessionManager;

fn fast_config() -> Config {
    let mut config = Config::default();
    config.scanner.delay = "0ms".to_string();
    config.scanner.threads = 100;
    config.waf_bypass.enabled = false;
    config
}

fn client_with_sessions(pairs: &[(&str, &str)]) -> SmartClient {
    let mut sessions = SessionManager::new();
    for (name, cookies) in pairs {
        sessions.add_session(name, cookies);
    }
    SmartClient::new(&fast_config(), sessions, Arc::new(ProxyManager::new(&[]))).unwrap()
}

#[tokio::test]
async fn test_cross_session_access_detected() {
    let server = MockServer::start().await;

    // User A's profile: 500 bytes for A, 505 bytes for B (the server
    // leaks the same record to both), 401 anonymously.
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Cookie", "sid=aaa"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(500)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Cookie", "sid=bbb"))
        .respond_with(ResponseTemplate::new(200).set_body_string("b".repeat(505)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .with_priority(50)
        .mount(&server)
        .await;

    let client = client_with_sessions(&[("user_a", "sid=aaa"), ("user_b", "sid=bbb")]);

    let mut tester = AuthMatrixTester::new(&client);
    tester.add_session("user_a");
    tester.add_session("user_b");

    let result = tester
        .test_endpoint(&format!("{}/me", server.uri()), HttpMethod::Get)
        .await;

    assert_eq!(result.probes.len(), 3);
    assert!(result.is_vulnerable);
    // delta = 5 bytes, 1% of the owner's 500-byte body.
    assert_eq!(
        result.reason.as_deref(),
        Some("Session 'user_b' can access 'user_a' resource")
    );
}

#[tokio::test]
async fn test_anonymous_access_detected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(200).set_body_string("full dump"))
        .mount(&server)
        .await;

    let client = client_with_sessions(&[("user_a", "sid=aaa")]);
    let mut tester = AuthMatrixTester::new(&client);
    tester.add_session("user_a");

    let result = tester
        .test_endpoint(&format!("{}/export", server.uri()), HttpMethod::Get)
        .await;

    assert!(result.is_vulnerable);
    assert_eq!(
        result.reason.as_deref(),
        Some("Unauthenticated access to protected resource")
    );
}

#[tokio::test]
async fn test_properly_scoped_sessions_pass() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Cookie", "sid=aaa"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(500)))
        .with_priority(1)
        .mount(&server)
        .await;
    // User B gets their own, much smaller record.
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Cookie", "sid=bbb"))
        .respond_with(ResponseTemplate::new(200).set_body_string("b".repeat(2000)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(401))
        .with_priority(50)
        .mount(&server)
        .await;

    let client = client_with_sessions(&[("user_a", "sid=aaa"), ("user_b", "sid=bbb")]);
    let mut tester = AuthMatrixTester::new(&client);
    tester.add_session("user_a");
    tester.add_session("user_b");

    let result = tester
        .test_endpoint(&format!("{}/me", server.uri()), HttpMethod::Get)
        .await;

    assert!(!result.is_vulnerable);
    assert!(result.reason.is_none());
}
