// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - IDOR Response Detector
 * Classifies responses against valid and invalid baselines
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::analyzer::ResponseComparator;
use crate::http_client::HttpResponse;

/// Body length below which a 2xx response is treated as a probable error
/// page rather than resource content.
const MIN_CONTENT_LENGTH: usize = 100;

/// PII patterns checked against response bodies. Category name -> regex.
static PII_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "email",
            Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap(),
        ),
        (
            "phone_us",
            Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap(),
        ),
        (
            "phone_intl",
            Regex::new(r"\+\d{1,3}[-.\s]?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,9}").unwrap(),
        ),
        ("ssn", Regex::new(r"\d{3}-\d{2}-\d{4}").unwrap()),
        (
            "credit_card",
            Regex::new(r"\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}").unwrap(),
        ),
        (
            "api_key",
            Regex::new(r#"(api[_-]?key|apikey|api_secret)["\s:=]+["']?([a-zA-Z0-9_-]{20,})["']?"#)
                .unwrap(),
        ),
        (
            "jwt",
            Regex::new(r"eyJ[a-zA-Z0-9_-]*\.eyJ[a-zA-Z0-9_-]*\.[a-zA-Z0-9_-]*").unwrap(),
        ),
        (
            "password",
            Regex::new(r#"(password|passwd|pwd)["\s:=]+["']?([^"'\s]{4,})["']?"#).unwrap(),
        ),
        (
            "private_key",
            Regex::new(r"-----BEGIN (RSA |EC |DSA |OPENSSH )?PRIVATE KEY-----").unwrap(),
        ),
    ]
});

/// Phrases that mark a 2xx body as a templated error page.
const SOFT_ERROR_INDICATORS: &[&str] = &[
    "not found",
    "does not exist",
    "no results",
    "invalid id",
    "resource not found",
    "404",
    "error",
    "unauthorized",
    "access denied",
];

/// Detailed verdict from [`IdorDetector::detect_with_evidence`].
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    pub is_vulnerable: bool,
    pub reasons: Vec<String>,
    pub pii_found: HashMap<String, Vec<String>>,
    pub status_code: u16,
    pub content_length: usize,
    pub similarity: f64,
    /// Advisory: body matched a soft-error phrase. Never suppresses a
    /// positive verdict on its own.
    pub soft_error: bool,
}

/// Classifies responses against two reference baselines captured before
/// the scan: what legitimate access looks like, and what the server
/// returns for a definitely-non-existent id.
pub struct IdorDetector {
    valid: Option<ResponseComparator>,
    invalid: Option<ResponseComparator>,
    threshold: f64,
    check_pii: bool,
}

impl IdorDetector {
    pub fn new(
        valid_baseline: Option<HttpResponse>,
        invalid_baseline: Option<HttpResponse>,
        threshold: f64,
        check_pii: bool,
    ) -> Self {
        Self {
            valid: valid_baseline.map(ResponseComparator::new),
            invalid: invalid_baseline.map(ResponseComparator::new),
            threshold,
            check_pii,
        }
    }

    /// Fast boolean verdict, same rules as [`detect_with_evidence`].
    pub fn detect(&self, response: &HttpResponse) -> bool {
        self.status_gap_bypass(response)
            || self.content_divergence(response).is_some()
            || (self.check_pii && self.contains_pii(&response.body))
    }

    /// Full verdict with reasons, PII matches and the similarity score.
    pub fn detect_with_evidence(&self, response: &HttpResponse) -> DetectionResult {
        let mut result = DetectionResult {
            status_code: response.status_code,
            content_length: response.body.len(),
            similarity: 1.0,
            soft_error: Self::is_soft_error(response),
            ..DetectionResult::default()
        };

        if self.status_gap_bypass(response) {
            let invalid_status = self
                .invalid
                .as_ref()
                .map(|c| c.baseline().status_code)
                .unwrap_or_default();
            result.is_vulnerable = true;
            result.reasons.push(format!(
                "Status bypass: invalid id returned {}, this id returned {}",
                invalid_status, response.status_code
            ));
        }

        if let Some(similarity) = self.content_divergence(response) {
            result.is_vulnerable = true;
            result
                .reasons
                .push("Content diverges from valid baseline".to_string());
            result.similarity = similarity;
        } else if let Some(comparator) = &self.valid {
            result.similarity = comparator.compare(response).similarity;
        }

        if self.check_pii {
            let pii = self.pii_matches(&response.body);
            if !pii.is_empty() {
                result.is_vulnerable = true;
                result.reasons.push("PII detected in response".to_string());
                result.pii_found = pii;
            }
        }

        result
    }

    /// Rule 1: a success status where the invalid baseline was an auth or
    /// not-found status means the id check was bypassed.
    fn status_gap_bypass(&self, response: &HttpResponse) -> bool {
        if !response.is_success() {
            return false;
        }
        match &self.invalid {
            Some(comparator) => {
                matches!(comparator.baseline().status_code, 401 | 403 | 404)
            }
            None => false,
        }
    }

    /// Rule 2: a substantial 2xx body far from the valid baseline is
    /// likely another user's resource. Returns the similarity when the
    /// rule fires. The size guards exclude trivial error pages.
    fn content_divergence(&self, response: &HttpResponse) -> Option<f64> {
        let comparator = self.valid.as_ref()?;
        if !response.is_success() {
            return None;
        }

        let similarity = comparator.compare(response).similarity;
        let body_len = response.body.len();
        let baseline_len = comparator.baseline().body.len();

        if similarity < self.threshold
            && body_len > MIN_CONTENT_LENGTH
            && body_len > baseline_len / 2
        {
            Some(similarity)
        } else {
            None
        }
    }

    pub fn contains_pii(&self, body: &str) -> bool {
        PII_PATTERNS.iter().any(|(_, re)| re.is_match(body))
    }

    /// All PII matches found in a body, grouped by category.
    pub fn pii_matches(&self, body: &str) -> HashMap<String, Vec<String>> {
        let mut matches = HashMap::new();
        for (name, re) in PII_PATTERNS.iter() {
            let found: Vec<String> = re.find_iter(body).map(|m| m.as_str().to_string()).collect();
            if !found.is_empty() {
                matches.insert(name.to_string(), found);
            }
        }
        matches
    }

    /// Advisory check for templated error pages served with a 2xx status.
    pub fn is_soft_error(response: &HttpResponse) -> bool {
        let body = response.body.to_lowercase();
        SOFT_ERROR_INDICATORS
            .iter()
            .any(|indicator| body.contains(indicator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status_code: status,
            body: body.to_string(),
            headers: Map::new(),
            duration_ms: 0,
        }
    }

    fn detector(
        valid: Option<HttpResponse>,
        invalid: Option<HttpResponse>,
        check_pii: bool,
    ) -> IdorDetector {
        IdorDetector::new(valid, invalid, 0.8, check_pii)
    }

    #[test]
    fn test_status_gap_bypass() {
        let det = detector(
            Some(response(200, &"x".repeat(500))),
            Some(response(403, "Forbidden")),
            true,
        );
        let probe = response(200, "{\"email\":\"a@b.com\"}");
        let result = det.detect_with_evidence(&probe);

        assert!(result.is_vulnerable);
        assert!(result.reasons.iter().any(|r| r.contains("Status bypass")));
        assert!(result.pii_found.contains_key("email"));
    }

    #[test]
    fn test_content_divergence_without_pii() {
        let det = detector(
            Some(response(200, &"a".repeat(20))),
            Some(response(200, &"a".repeat(20))),
            true,
        );
        let probe = response(200, &"z".repeat(4000));
        let result = det.detect_with_evidence(&probe);

        assert!(result.is_vulnerable);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.contains("Content diverges")));
        assert!(result.similarity < 0.8);
        assert!(result.pii_found.is_empty());
    }

    #[test]
    fn test_soft_error_page_not_flagged() {
        let det = detector(
            Some(response(200, &"a".repeat(20))),
            Some(response(200, &"a".repeat(20))),
            true,
        );
        // 16-byte body fails the content-length guard; no auth-status gap.
        let probe = response(200, "Error: not found");
        let result = det.detect_with_evidence(&probe);

        assert!(!result.is_vulnerable);
        assert!(result.soft_error);
    }

    #[test]
    fn test_soft_error_never_suppresses_verdict() {
        let det = detector(None, Some(response(403, "Forbidden")), false);
        // Body reads like an error page, but the status gap still fires.
        let probe = response(200, &format!("not found {}", "x".repeat(200)));
        let result = det.detect_with_evidence(&probe);

        assert!(result.soft_error);
        assert!(result.is_vulnerable);
    }

    #[test]
    fn test_no_baselines_no_pii_is_clean() {
        let det = detector(None, None, false);
        assert!(!det.detect(&response(200, &"x".repeat(5000))));
    }

    #[test]
    fn test_error_status_never_vulnerable_without_pii() {
        let det = detector(
            Some(response(200, &"x".repeat(500))),
            Some(response(403, "Forbidden")),
            false,
        );
        assert!(!det.detect(&response(403, "Forbidden")));
        assert!(!det.detect(&response(500, &"x".repeat(5000))));
    }

    #[test]
    fn test_pii_categories() {
        let det = detector(None, None, true);
        let body = r#"{"email":"user@example.com","ssn":"123-45-6789","token":"eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.sig"}"#;
        let matches = det.pii_matches(body);

        assert!(matches.contains_key("email"));
        assert!(matches.contains_key("ssn"));
        assert!(matches.contains_key("jwt"));
        assert!(det.detect(&response(500, body)));
    }

    #[test]
    fn test_divergence_needs_substantial_body() {
        let det = detector(
            Some(response(200, &"a".repeat(4000))),
            Some(response(200, "ok")),
            false,
        );
        // Dissimilar but under half the baseline length: likely an error page.
        assert!(!det.detect(&response(200, &"z".repeat(150))));
    }
}
