// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - WAF Evasion Policy
 * Header injection and User-Agent rotation applied per request
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Realistic browser User-Agents rotated per request to avoid blocks
const BROWSER_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Firefox on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Edge on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Headers added in aggressive mode to spoof the client origin past
/// IP-based allowlists.
const AGGRESSIVE_HEADERS: &[(&str, &str)] = &[
    ("X-Originating-IP", "127.0.0.1"),
    ("X-Remote-IP", "127.0.0.1"),
    ("X-Client-IP", "127.0.0.1"),
    ("True-Client-IP", "127.0.0.1"),
    ("Cluster-Client-IP", "127.0.0.1"),
    ("X-Forwarded-Host", "localhost"),
];

/// Evasion intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BypassMode {
    /// No evasion at all.
    None,
    /// Configured bypass headers + UA rotation.
    #[default]
    Normal,
    /// Normal plus origin-spoofing headers.
    Aggressive,
    /// UA rotation only. No injected headers, for targets that flag
    /// unusual X-Forwarded-* combinations.
    Stealth,
}

impl BypassMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(BypassMode::None),
            "normal" => Some(BypassMode::Normal),
            "aggressive" => Some(BypassMode::Aggressive),
            "stealth" => Some(BypassMode::Stealth),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BypassMode::None => "none",
            BypassMode::Normal => "normal",
            BypassMode::Aggressive => "aggressive",
            BypassMode::Stealth => "stealth",
        }
    }
}

impl std::fmt::Display for BypassMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request evasion policy. The mode is runtime-mutable (the CLI can
/// escalate when a target starts blocking), so it sits behind a RwLock.
pub struct WafBypass {
    mode: RwLock<BypassMode>,
    headers: HashMap<String, String>,
    user_agents: Vec<String>,
}

impl WafBypass {
    pub fn new(mode: BypassMode, headers: HashMap<String, String>) -> Self {
        Self {
            mode: RwLock::new(mode),
            headers,
            user_agents: BROWSER_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn mode(&self) -> BypassMode {
        *self.mode.read()
    }

    pub fn set_mode(&self, mode: BypassMode) {
        *self.mode.write() = mode;
    }

    /// Uniform random pick over the UA pool.
    pub fn random_user_agent(&self) -> &str {
        let idx = rand::rng().random_range(0..self.user_agents.len());
        &self.user_agents[idx]
    }

    /// Compute the header set for one outgoing request.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let mode = self.mode();
        let mut out = Vec::new();

        if mode == BypassMode::None {
            return out;
        }

        // Every active mode rotates the User-Agent.
        out.push((
            "User-Agent".to_string(),
            self.random_user_agent().to_string(),
        ));

        if mode == BypassMode::Stealth {
            return out;
        }

        for (name, value) in &self.headers {
            out.push((name.clone(), value.clone()));
        }

        if mode == BypassMode::Aggressive {
            for (name, value) in AGGRESSIVE_HEADERS {
                out.push((name.to_string(), value.to_string()));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bypass_with(mode: BypassMode) -> WafBypass {
        let mut headers = HashMap::new();
        headers.insert("X-Forwarded-For".to_string(), "127.0.0.1".to_string());
        WafBypass::new(mode, headers)
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(BypassMode::parse("aggressive"), Some(BypassMode::Aggressive));
        assert_eq!(BypassMode::parse("NONE"), Some(BypassMode::None));
        assert_eq!(BypassMode::parse("bogus"), None);
    }

    #[test]
    fn test_none_mode_adds_nothing() {
        let bypass = bypass_with(BypassMode::None);
        assert!(bypass.request_headers().is_empty());
    }

    #[test]
    fn test_normal_mode_injects_headers_and_ua() {
        let bypass = bypass_with(BypassMode::Normal);
        let headers = bypass.request_headers();
        assert!(headers.iter().any(|(k, _)| k == "User-Agent"));
        assert!(headers.iter().any(|(k, _)| k == "X-Forwarded-For"));
        assert!(!headers.iter().any(|(k, _)| k == "X-Originating-IP"));
    }

    #[test]
    fn test_aggressive_mode_spoofs_origin() {
        let bypass = bypass_with(BypassMode::Aggressive);
        let headers = bypass.request_headers();
        assert!(headers.iter().any(|(k, _)| k == "X-Originating-IP"));
        assert!(headers.iter().any(|(k, _)| k == "True-Client-IP"));
    }

    #[test]
    fn test_stealth_mode_only_rotates_ua() {
        let bypass = bypass_with(BypassMode::Stealth);
        let headers = bypass.request_headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].0, "User-Agent");
    }

    #[test]
    fn test_runtime_mode_switch() {
        let bypass = bypass_with(BypassMode::Normal);
        bypass.set_mode(BypassMode::Aggressive);
        assert_eq!(bypass.mode(), BypassMode::Aggressive);
    }

    #[test]
    fn test_user_agent_from_pool() {
        let bypass = bypass_with(BypassMode::Normal);
        let ua = bypass.random_user_agent();
        assert!(BROWSER_USER_AGENTS.contains(&ua));
    }
}
