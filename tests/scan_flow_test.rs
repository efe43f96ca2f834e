// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Flow Tests
 * End-to-end engine behavior against a mock API
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use idorplus_scanner::config::Config;
use idorplus_scanner::detector::IdorDetector;
use idorplus_scanner::fuzzer::{FuzzEngine, FuzzJob};
use idorplus_scanner::http_client::{HttpMethod, SmartClient};
use idorplus_scanner::proxy::ProxyManager;
use idorplus_scanner::session::{Session, SessionManager};
use idorplus_scanner::utils::substitute_payload;

fn fast_config() -> Config {
    let mut config = Config::default();
    config.scanner.delay = "0ms".to_string();
    config.scanner.timeout = "5s".to_string();
    // High ceiling so tests are not paced by the limiter.
    config.scanner.threads = 100;
    config.waf_bypass.enabled = false;
    config
}

fn client_with(config: &Config, sessions: SessionManager) -> Arc<SmartClient> {
    let proxies = Arc::new(ProxyManager::new(&[]));
    Arc::new(SmartClient::new(config, sessions, proxies).unwrap())
}

async fn mount_user_api(server: &MockServer) {
    // Three real users leak profile data; everything else is denied.
    for (id, email) in [(1, "alice@example.com"), (2, "bob@example.com"), (3, "carol@example.com")]
    {
        Mock::given(method("GET"))
            .and(path(format!("/api/users/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "{{\"id\":{},\"email\":\"{}\",\"role\":\"user\"}}",
                id, email
            )))
            .with_priority(1)
            .mount(server)
            .await;
    }

    Mock::given(any())
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .with_priority(50)
        .mount(server)
        .await;
}

fn job(id: u64, url: String) -> FuzzJob {
    FuzzJob {
        id,
        url,
        method: HttpMethod::Get,
        payload: id.to_string(),
        body: None,
        headers: HashMap::new(),
        session: None,
    }
}

#[tokio::test]
async fn test_scan_detects_status_bypass_with_pii() {
    let server = MockServer::start().await;
    mount_user_api(&server).await;

    let config = fast_config();
    let client = client_with(&config, SessionManager::new());
    let template = format!("{}/api/users/{{ID}}", server.uri());

    // Baselines: invalid id denied, valid id owned by the operator.
    let invalid = client
        .get(&substitute_payload(&template, "999999999999999"))
        .await
        .unwrap();
    assert_eq!(invalid.status_code, 403);
    let valid = client.get(&substitute_payload(&template, "1")).await.unwrap();
    assert_eq!(valid.status_code, 200);

    let detector = Arc::new(IdorDetector::new(Some(valid), Some(invalid), 0.8, true));
    let engine = Arc::new(FuzzEngine::new(client, 4, Some(detector), 3));
    engine.start();
    let mut results = engine.take_results().unwrap();

    let total_jobs = 20u64;
    for i in 1..=total_jobs {
        let url = substitute_payload(&template, &i.to_string());
        assert!(engine.submit(job(i, url)).await);
    }
    engine.close_queue();

    let shutdown = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.wait_and_close().await })
    };

    let mut vulnerable = Vec::new();
    let mut seen = 0u64;
    while let Some(result) = results.recv().await {
        seen += 1;
        assert!(result.error.is_none());
        if result.is_vulnerable {
            vulnerable.push(result);
        }
    }
    shutdown.await.unwrap();

    // One result per accepted submission.
    assert_eq!(seen, total_jobs);

    // Exactly the three live users trip the status-gap rule.
    assert_eq!(vulnerable.len(), 3);
    for result in &vulnerable {
        assert_eq!(result.status_code, Some(200));
        let detection = result.detection.as_ref().unwrap();
        assert!(detection.reasons.iter().any(|r| r.contains("Status bypass")));
        assert!(detection.pii_found.contains_key("email"));
    }

    let stats = engine.stats();
    assert_eq!(stats.total(), total_jobs);
    assert_eq!(stats.total(), stats.success() + stats.failed());
    assert_eq!(stats.failed(), 0);
    assert_eq!(stats.vuln_count(), 3);
}

#[tokio::test]
async fn test_session_credentials_reach_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("Cookie", "sid=attacker-token"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":1}"))
        .mount(&server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .with_priority(50)
        .mount(&server)
        .await;

    let config = fast_config();
    let mut sessions = SessionManager::new();
    sessions.insert(
        Session::new("attacker", "sid=attacker-token")
            .with_header("Authorization", "Bearer tok-123"),
    );
    let client = client_with(&config, sessions);

    let url = format!("{}/api/me", server.uri());
    let with_session = client.get_with_session(&url, Some("attacker")).await.unwrap();
    assert_eq!(with_session.status_code, 200);

    let anonymous = client.get(&url).await.unwrap();
    assert_eq!(anonymous.status_code, 401);
}

#[tokio::test]
async fn test_retry_counts_transport_failure_once() {
    // Unroutable port: every attempt errors, the job is counted failed
    // exactly once and carries the error on its single result.
    let config = fast_config();
    let client = client_with(&config, SessionManager::new());

    let engine = Arc::new(FuzzEngine::new(client, 2, None, 2));
    engine.start();
    let mut results = engine.take_results().unwrap();

    assert!(engine.submit(job(1, "http://127.0.0.1:1/api".to_string())).await);
    engine.close_queue();

    let shutdown = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.wait_and_close().await })
    };

    let result = tokio::time::timeout(Duration::from_secs(30), results.recv())
        .await
        .expect("result not emitted")
        .expect("channel closed early");
    assert!(results.recv().await.is_none());
    shutdown.await.unwrap();

    assert!(result.status_code.is_none());
    assert!(result.error.is_some());
    assert!(!result.is_vulnerable);
    assert_eq!(result.content_length, 0);

    let stats = engine.stats();
    assert_eq!(stats.total(), 1);
    assert_eq!(stats.failed(), 1);
    assert_eq!(stats.success(), 0);
}

#[tokio::test]
async fn test_cancellation_mid_scan_unwinds() {
    let server = MockServer::start().await;
    // Slow responses keep jobs in flight while we cancel.
    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("ok")
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&server)
        .await;

    let config = fast_config();
    let client = client_with(&config, SessionManager::new());
    let engine = Arc::new(FuzzEngine::new(client, 4, None, 3));
    engine.start();
    let mut results = engine.take_results().unwrap();

    let producer = {
        let engine = Arc::clone(&engine);
        let base = server.uri();
        tokio::spawn(async move {
            let mut accepted = 0u64;
            for i in 0..1000u64 {
                let url = format!("{}/item/{}", base, i);
                if !engine.submit(job(i, url)).await {
                    break;
                }
                accepted += 1;
            }
            engine.close_queue();
            accepted
        })
    };

    let mut received = 0u64;
    while let Some(_result) = results.recv().await {
        received += 1;
        if received == 20 {
            engine.cancel();
            break;
        }
    }
    // Drain whatever the workers still emit.
    while results.recv().await.is_some() {}

    let accepted = tokio::time::timeout(Duration::from_secs(10), producer)
        .await
        .expect("producer blocked after cancel")
        .unwrap();

    tokio::time::timeout(Duration::from_secs(10), engine.wait_and_close())
        .await
        .expect("workers blocked after cancel");

    assert!(engine.is_cancelled());
    assert!(accepted <= 1000);

    let stats = engine.stats();
    assert!(stats.total() <= accepted);
    assert!(stats.success() + stats.failed() <= stats.total());

    // Submissions after cancellation are rejected outright.
    assert!(!engine.submit(job(9999, format!("{}/late", server.uri()))).await);
}

#[tokio::test]
async fn test_waf_headers_applied_per_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/probe"))
        .and(header("X-Forwarded-For", "127.0.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("bypassed"))
        .mount(&server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(406))
        .with_priority(50)
        .mount(&server)
        .await;

    let mut config = fast_config();
    config.waf_bypass.enabled = true;
    let client = client_with(&config, SessionManager::new());

    let response = client.get(&format!("{}/probe", server.uri())).await.unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "bypassed");
}
