// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Authorization Matrix Tester
 * Cross-session access probe: every session plus anonymous against one endpoint
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;
use tracing::{debug, info};

use crate::http_client::{HttpMethod, SmartClient};

/// Body-length slack under which two granted responses are considered the
/// same resource.
const SAME_RESOURCE_ABS_DIFF: usize = 50;
const SAME_RESOURCE_REL_DIFF: f64 = 0.10;

/// Result of probing one endpoint with one session.
#[derive(Debug, Clone)]
pub struct SessionProbe {
    pub session_name: String,
    pub status_code: u16,
    pub content_length: usize,
    pub has_access: bool,
}

/// Full matrix outcome for one endpoint.
#[derive(Debug, Clone)]
pub struct MatrixResult {
    pub endpoint: String,
    pub method: HttpMethod,
    pub probes: Vec<SessionProbe>,
    pub is_vulnerable: bool,
    pub reason: Option<String>,
}

/// Probes one (url, method) pair under every registered session and once
/// anonymously, then compares who got in.
///
/// Read-only side probe: it never touches engine state. The first session
/// added is treated as the resource owner.
pub struct AuthMatrixTester<'a> {
    client: &'a SmartClient,
    session_order: Vec<String>,
}

impl<'a> AuthMatrixTester<'a> {
    pub fn new(client: &'a SmartClient) -> Self {
        Self {
            client,
            session_order: Vec::new(),
        }
    }

    /// Register a session for the matrix. Order matters: the first
    /// session is the putative owner.
    pub fn add_session(&mut self, name: &str) {
        if !self.session_order.iter().any(|s| s == name) {
            self.session_order.push(name.to_string());
        }
    }

    pub async fn test_endpoint(&self, url: &str, method: HttpMethod) -> MatrixResult {
        info!("Auth matrix: {} {}", method, url);

        let mut probes = Vec::with_capacity(self.session_order.len() + 1);

        for name in &self.session_order {
            probes.push(self.probe(url, method, Some(name)).await);
        }
        probes.push(self.probe(url, method, None).await);

        let (is_vulnerable, reason) = analyze_matrix(&probes);

        MatrixResult {
            endpoint: url.to_string(),
            method,
            probes,
            is_vulnerable,
            reason,
        }
    }

    async fn probe(&self, url: &str, method: HttpMethod, session: Option<&str>) -> SessionProbe {
        let session_name = session.unwrap_or("anonymous").to_string();

        match self
            .client
            .execute(method, url, &HashMap::new(), session, None)
            .await
        {
            Ok(response) => {
                debug!(
                    "Matrix probe {}: status={} len={}",
                    session_name,
                    response.status_code,
                    response.body.len()
                );
                SessionProbe {
                    session_name,
                    status_code: response.status_code,
                    content_length: response.content_length(),
                    has_access: response.is_success(),
                }
            }
            Err(err) => {
                debug!("Matrix probe {} failed: {}", session_name, err);
                SessionProbe {
                    session_name,
                    status_code: 0,
                    content_length: 0,
                    has_access: false,
                }
            }
        }
    }
}

/// Decide whether the probe set shows an authorization failure. The first
/// non-anonymous probe is the owner.
fn analyze_matrix(probes: &[SessionProbe]) -> (bool, Option<String>) {
    let owner = match probes.iter().find(|p| p.session_name != "anonymous") {
        Some(owner) => owner,
        None => return (false, None),
    };

    if let Some(anon) = probes.iter().find(|p| p.session_name == "anonymous") {
        if anon.has_access {
            return (
                true,
                Some("Unauthenticated access to protected resource".to_string()),
            );
        }
    }

    if !owner.has_access {
        return (false, None);
    }

    for probe in probes {
        if probe.session_name == owner.session_name || probe.session_name == "anonymous" {
            continue;
        }
        if !probe.has_access {
            continue;
        }

        // Both got in. Near-identical body sizes mean both sessions
        // received the owner's resource, not their own copy of it.
        // An empty owner body can only match via the absolute check.
        let diff = owner.content_length.abs_diff(probe.content_length);
        let rel = if owner.content_length > 0 {
            diff as f64 / owner.content_length as f64
        } else {
            f64::INFINITY
        };

        if diff < SAME_RESOURCE_ABS_DIFF || rel < SAME_RESOURCE_REL_DIFF {
            return (
                true,
                Some(format!(
                    "Session '{}' can access '{}' resource",
                    probe.session_name, owner.session_name
                )),
            );
        }
    }

    (false, None)
}
