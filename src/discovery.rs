// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Shadow API Discovery
 * Extracts undocumented endpoints from HTML, JavaScript and JSON bodies
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Path fragments that mark an endpoint as internal or privileged.
const INTERNAL_MARKERS: &[&str] = &["internal", "admin", "private", "debug", "staging"];

static JS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Fetch API
        Regex::new(r#"fetch\s*\(\s*['"]([^'"]+)['"]"#).unwrap(),
        // Axios with explicit method
        Regex::new(r#"axios\.(?:get|post|put|delete|patch)\s*\(\s*['"]([^'"]+)['"]"#).unwrap(),
        // XMLHttpRequest open
        Regex::new(r#"\.open\s*\(\s*['"]\w+['"]\s*,\s*['"]([^'"]+)['"]"#).unwrap(),
        // url: config entries
        Regex::new(r#"(?:url|endpoint|path|route)\s*[:=]\s*['"](/[^'"]+)['"]"#).unwrap(),
        // String literals with API shapes
        Regex::new(r#"['"](/api/[^'"]+)['"]"#).unwrap(),
        Regex::new(r#"['"](/v\d+/[^'"]+)['"]"#).unwrap(),
        Regex::new(r#"['"](/graphql[^'"]*)['"]"#).unwrap(),
    ]
});

static HTML_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"<form[^>]+action\s*=\s*['"]([^'"]+)['"]"#).unwrap(),
        Regex::new(r#"data-(?:url|endpoint|api)\s*=\s*['"]([^'"]+)['"]"#).unwrap(),
        Regex::new(r#"href\s*=\s*['"](/api/[^'"]+)['"]"#).unwrap(),
    ]
});

/// Parameter names that suggest an object identifier.
static ID_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[_\-?&/{])(id|user_?id|account_?id|object_?id|resource_?id)(?:[=}/]|$)").unwrap());

/// Numeric or UUID-shaped path segments also count as id parameters.
static PATH_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(\d+|[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})(?:/|$)")
        .unwrap()
});

/// A discovered endpoint with classification flags.
#[derive(Debug, Clone)]
pub struct EndpointInfo {
    pub url: String,
    pub source: String,
    pub has_id_params: bool,
    pub is_internal: bool,
}

/// Accumulates endpoints extracted from crawled content, de-duplicated
/// by URL.
#[derive(Debug, Default)]
pub struct ShadowApiDiscoverer {
    endpoints: HashMap<String, EndpointInfo>,
}

impl ShadowApiDiscoverer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract endpoint candidates from JavaScript source.
    pub fn extract_from_js(&mut self, content: &str, source_url: &str) {
        for pattern in JS_PATTERNS.iter() {
            for caps in pattern.captures_iter(content) {
                if let Some(m) = caps.get(1) {
                    self.record(m.as_str(), source_url);
                }
            }
        }
    }

    /// Extract endpoint candidates from HTML (forms, data attributes).
    pub fn extract_from_html(&mut self, content: &str, source_url: &str) {
        for pattern in HTML_PATTERNS.iter() {
            for caps in pattern.captures_iter(content) {
                if let Some(m) = caps.get(1) {
                    self.record(m.as_str(), source_url);
                }
            }
        }
        // Inline <script> blocks carry the same signal as external JS.
        self.extract_from_js(content, source_url);
    }

    /// Extract URL-shaped string values from a JSON body.
    pub fn extract_from_json(&mut self, content: &str, source_url: &str) {
        static JSON_URL_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r#""((?:https?://|/)[^"\s]+)""#).unwrap());

        for caps in JSON_URL_RE.captures_iter(content) {
            if let Some(m) = caps.get(1) {
                self.record(m.as_str(), source_url);
            }
        }
    }

    fn record(&mut self, url: &str, source: &str) {
        let url = url.trim();
        if url.len() < 2 || url.starts_with("//") || url.contains("${") {
            return;
        }

        self.endpoints
            .entry(url.to_string())
            .or_insert_with(|| EndpointInfo {
                url: url.to_string(),
                source: source.to_string(),
                has_id_params: has_id_params(url),
                is_internal: is_internal(url),
            });
    }

    pub fn all(&self) -> Vec<EndpointInfo> {
        let mut endpoints: Vec<EndpointInfo> = self.endpoints.values().cloned().collect();
        endpoints.sort_by(|a, b| a.url.cmp(&b.url));
        endpoints
    }

    pub fn internal_only(&self) -> Vec<EndpointInfo> {
        self.all().into_iter().filter(|e| e.is_internal).collect()
    }

    /// Endpoints carrying an object identifier: the IDOR candidates.
    pub fn with_id_params(&self) -> Vec<EndpointInfo> {
        self.all().into_iter().filter(|e| e.has_id_params).collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

fn has_id_params(url: &str) -> bool {
    ID_PARAM_RE.is_match(url) || PATH_ID_RE.is_match(url)
}

fn is_internal(url: &str) -> bool {
    let lower = url.to_lowercase();
    INTERNAL_MARKERS.iter().any(|m| lower.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fetch_and_axios() {
        let js = r#"
            fetch('/api/users/123');
            axios.get("/v1/orders/456");
            axios.post('/api/internal/reset');
        "#;
        let mut discoverer = ShadowApiDiscoverer::new();
        discoverer.extract_from_js(js, "http://x/app.js");

        let urls: Vec<String> = discoverer.all().into_iter().map(|e| e.url).collect();
        assert!(urls.contains(&"/api/users/123".to_string()));
        assert!(urls.contains(&"/v1/orders/456".to_string()));
        assert!(urls.contains(&"/api/internal/reset".to_string()));
    }

    #[test]
    fn test_id_param_classification() {
        let mut discoverer = ShadowApiDiscoverer::new();
        discoverer.extract_from_js(
            r#"fetch('/api/users/123'); fetch('/api/health');"#,
            "http://x/app.js",
        );

        let with_ids = discoverer.with_id_params();
        assert_eq!(with_ids.len(), 1);
        assert_eq!(with_ids[0].url, "/api/users/123");
    }

    #[test]
    fn test_uuid_path_counts_as_id() {
        assert!(has_id_params(
            "/api/docs/550e8400-e29b-41d4-a716-446655440000"
        ));
        assert!(has_id_params("/api/users?user_id=5"));
        assert!(!has_id_params("/api/status"));
    }

    #[test]
    fn test_internal_classification() {
        let mut discoverer = ShadowApiDiscoverer::new();
        discoverer.extract_from_js(
            r#"fetch('/api/admin/users'); fetch('/api/public/posts');"#,
            "http://x/app.js",
        );

        let internal = discoverer.internal_only();
        assert_eq!(internal.len(), 1);
        assert!(internal[0].url.contains("/admin/"));
    }

    #[test]
    fn test_html_form_extraction() {
        let html = r#"<form action="/api/profile/update" method="post">
            <div data-endpoint="/api/users/me"></div>"#;
        let mut discoverer = ShadowApiDiscoverer::new();
        discoverer.extract_from_html(html, "http://x/");

        let urls: Vec<String> = discoverer.all().into_iter().map(|e| e.url).collect();
        assert!(urls.contains(&"/api/profile/update".to_string()));
        assert!(urls.contains(&"/api/users/me".to_string()));
    }

    #[test]
    fn test_template_literals_skipped() {
        let mut discoverer = ShadowApiDiscoverer::new();
        discoverer.extract_from_js(r#"fetch('/api/users/${id}');"#, "http://x/app.js");
        assert!(discoverer.is_empty());
    }

    #[test]
    fn test_duplicates_collapsed() {
        let mut discoverer = ShadowApiDiscoverer::new();
        discoverer.extract_from_js(r#"fetch('/api/a'); fetch('/api/a');"#, "http://x/1.js");
        discoverer.extract_from_js(r#"fetch('/api/a');"#, "http://x/2.js");
        assert_eq!(discoverer.len(), 1);
    }
}
