// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Error Types
 * Production-ready error handling with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use thiserror::Error;

/// Main scanner error type
#[derive(Error, Debug)]
pub enum ScannerError {
    /// Configuration errors: bad flags, unparseable config, malformed URL.
    /// These abort the process before the scan starts.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Baseline acquisition failure. The detector cannot be calibrated
    /// without both reference responses, so the scan aborts.
    #[error("Baseline acquisition failed for {url}: {reason}")]
    Baseline { url: String, reason: String },

    /// Per-request transport errors: timeouts, DNS failures, TLS errors.
    /// Recovered by the retry loop or demoted to a failed-result entry.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The operation was cancelled (SIGINT/SIGTERM or programmatic).
    #[error("Operation cancelled")]
    Cancelled,

    /// Rate limiter refused to grant a token before cancellation fired.
    #[error("Rate limit wait aborted")]
    RateLimitAborted,

    /// Timeout errors
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Report serialization or file I/O errors. Logged, never fatal to
    /// the scan itself.
    #[error("Report error: {0}")]
    Report(String),

    /// Payload generation errors
    #[error("Payload error: {0}")]
    Payload(String),
}

impl ScannerError {
    /// True for errors that should abort the process with exit code 1.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScannerError::Configuration(_) | ScannerError::Baseline { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScannerError::Cancelled | ScannerError::RateLimitAborted)
    }
}

impl From<reqwest::Error> for ScannerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScannerError::Timeout {
                duration: Duration::from_secs(0),
            }
        } else {
            ScannerError::Transport(err.to_string())
        }
    }
}
