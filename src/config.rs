// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Configuration
 * YAML configuration with embedded defaults
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::waf_bypass::BypassMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub waf_bypass: WafBypassConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Per-request timeout, e.g. "10s" or "500ms".
    #[serde(default = "default_timeout")]
    pub timeout: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Minimum delay between requests, e.g. "100ms".
    #[serde(default = "default_delay")]
    pub delay: String,

    #[serde(default = "default_true")]
    pub verify_tls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WafBypassConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub mode: BypassMode,

    /// Extra headers injected on every request when bypass is enabled.
    #[serde(default = "default_bypass_headers")]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default = "default_true")]
    pub check_pii: bool,

    #[serde(default)]
    pub blind_idor: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default = "default_true")]
    pub verbose: bool,

    #[serde(default)]
    pub save_responses: bool,
}

fn default_threads() -> usize {
    10
}
fn default_timeout() -> String {
    "10s".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_delay() -> String {
    "100ms".to_string()
}
fn default_true() -> bool {
    true
}
fn default_threshold() -> f64 {
    0.8
}
fn default_format() -> String {
    "json".to_string()
}
fn default_bypass_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("X-Forwarded-For".to_string(), "127.0.0.1".to_string());
    headers.insert("X-Real-IP".to_string(), "127.0.0.1".to_string());
    headers
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            delay: default_delay(),
            verify_tls: true,
        }
    }
}

impl Default for WafBypassConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: BypassMode::default(),
            headers: default_bypass_headers(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            check_pii: true,
            blind_idor: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            verbose: true,
            save_responses: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            waf_bypass: WafBypassConfig::default(),
            detection: DetectionConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Load from file, falling back to embedded defaults when the file is
    /// missing. A malformed file is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            warn!("Config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn timeout(&self) -> Duration {
        parse_duration(&self.scanner.timeout).unwrap_or(Duration::from_secs(10))
    }

    pub fn delay(&self) -> Duration {
        parse_duration(&self.scanner.delay).unwrap_or(Duration::from_millis(100))
    }
}

/// Parse a duration string: "10s", "100ms", or a bare number of milliseconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        return ms.trim().parse::<u64>().ok().map(Duration::from_millis);
    }
    if let Some(secs) = s.strip_suffix('s') {
        return secs.trim().parse::<u64>().ok().map(Duration::from_secs);
    }
    s.parse::<u64>().ok().map(Duration::from_millis)
}
