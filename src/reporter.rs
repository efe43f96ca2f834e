// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Reporter
 * Findings with graded severity, serialized to JSON or Markdown
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::fuzzer::FuzzResult;
use crate::utils::{truncate_evidence, write_file_restricted};

/// Evidence kept per finding; anything longer is cut with a marker.
const MAX_EVIDENCE_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "CRITICAL")]
    Critical,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "LOW")]
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        };
        f.write_str(s)
    }
}

/// A fuzz result promoted to a reportable finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub url: String,
    pub method: String,
    pub payload: String,
    pub status_code: u16,
    pub content_length: usize,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub evidence: String,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub pii_found: HashMap<String, Vec<String>>,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    /// Wall-clock request duration in milliseconds.
    pub request_time: u64,
}

/// Complete scan report.
#[derive(Debug, Serialize, Deserialize)]
pub struct Report {
    pub scan_time: String,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_url: Option<String>,
    pub total_scans: u64,
    pub vulnerabilities_found: usize,
    pub findings: Vec<Finding>,
}

/// Collects findings during the scan and serializes them at the end.
pub struct Reporter {
    findings: Vec<Finding>,
    format: String,
    target_url: Option<String>,
    total_scans: u64,
    start_time: DateTime<Utc>,
    /// Status the invalid baseline returned; drives severity grading.
    invalid_baseline_status: Option<u16>,
}

impl Reporter {
    pub fn new(format: &str, invalid_baseline_status: Option<u16>) -> Self {
        Self {
            findings: Vec::new(),
            format: format.to_string(),
            target_url: None,
            total_scans: 0,
            start_time: Utc::now(),
            invalid_baseline_status,
        }
    }

    pub fn set_target_url(&mut self, url: &str) {
        self.target_url = Some(url.to_string());
    }

    pub fn set_total_scans(&mut self, total: u64) {
        self.total_scans = total;
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Promote a vulnerable fuzz result to a finding.
    pub fn add_finding(&mut self, result: &FuzzResult) {
        let pii_found = result
            .detection
            .as_ref()
            .map(|d| d.pii_found.clone())
            .unwrap_or_default();

        let finding = Finding {
            url: result.job.url.clone(),
            method: result.job.method.as_str().to_string(),
            payload: result.job.payload.clone(),
            status_code: result.status_code.unwrap_or(0),
            content_length: result.content_length,
            evidence: truncate_evidence(&result.evidence, MAX_EVIDENCE_LEN),
            severity: self.grade(result, !pii_found.is_empty()),
            pii_found,
            timestamp: Utc::now(),
            request_time: result.duration.as_millis() as u64,
        };

        self.findings.push(finding);
    }

    /// Severity grading against the invalid-baseline status:
    /// - CRITICAL: 2xx where the invalid id was denied (401/403) and the
    ///   body leaked PII
    /// - HIGH: 2xx where the invalid id was denied or absent (401/403/404)
    /// - MEDIUM: substantial 2xx body, but the invalid baseline was
    ///   already 2xx (weak differential)
    /// - LOW: anything else that still tripped a rule
    fn grade(&self, result: &FuzzResult, has_pii: bool) -> Severity {
        let status = result.status_code.unwrap_or(0);
        let success = (200..300).contains(&status);
        let invalid = self.invalid_baseline_status;

        if success && matches!(invalid, Some(401) | Some(403)) && has_pii {
            return Severity::Critical;
        }
        if success && matches!(invalid, Some(401) | Some(403) | Some(404)) {
            return Severity::High;
        }
        if success
            && result.content_length > 100
            && invalid.map(|s| (200..300).contains(&s)).unwrap_or(false)
        {
            return Severity::Medium;
        }
        Severity::Low
    }

    fn build_report(&self) -> Report {
        let elapsed = Utc::now().signed_duration_since(self.start_time);
        let duration = format!("{}s", elapsed.num_seconds().max(0));

        Report {
            scan_time: self.start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            duration,
            target_url: self.target_url.clone(),
            total_scans: self.total_scans,
            vulnerabilities_found: self.findings.len(),
            findings: self.findings.clone(),
        }
    }

    /// Serialize the report to disk (mode 0600).
    pub fn generate(&self, path: &Path) -> Result<()> {
        let report = self.build_report();

        let data = match self.format.as_str() {
            "markdown" | "md" => render_markdown(&report).into_bytes(),
            _ => serde_json::to_vec_pretty(&report)?,
        };

        write_file_restricted(path, &data)
    }
}

fn render_markdown(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# IDOR Scan Report\n\n");
    md.push_str(&format!("**Scan Time:** {}\n", report.scan_time));
    md.push_str(&format!("**Duration:** {}\n", report.duration));
    if let Some(target) = &report.target_url {
        md.push_str(&format!("**Target:** {}\n", target));
    }
    md.push_str(&format!("**Total Requests:** {}\n", report.total_scans));
    md.push_str(&format!(
        "**Vulnerabilities Found:** {}\n\n",
        report.vulnerabilities_found
    ));

    md.push_str("## Findings\n\n");

    for (idx, finding) in report.findings.iter().enumerate() {
        md.push_str(&format!("### {}. {}\n\n", idx + 1, finding.url));
        md.push_str(&format!("- **Method:** {}\n", finding.method));
        md.push_str(&format!("- **Payload:** `{}`\n", finding.payload));
        md.push_str(&format!("- **Status Code:** {}\n", finding.status_code));
        md.push_str(&format!("- **Severity:** {}\n", finding.severity));
        md.push_str(&format!(
            "- **Content Length:** {} bytes\n\n",
            finding.content_length
        ));

        if !finding.pii_found.is_empty() {
            let mut categories: Vec<&String> = finding.pii_found.keys().collect();
            categories.sort();
            md.push_str(&format!(
                "**PII Categories:** {}\n\n",
                categories
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if !finding.evidence.is_empty() {
            md.push_str("**Evidence:**\n```\n");
            md.push_str(&finding.evidence);
            md.push_str("\n```\n\n");
        }
    }

    md
}
