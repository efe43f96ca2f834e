// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Timing-based blind IDOR probe.
//!
//! Some backends return identical bodies for owned and foreign ids but
//! take measurably longer on one path (e.g. a permission lookup that only
//! runs when the record exists). Comparing median latencies for a known
//! valid id against a non-existent one surfaces that signal. The result
//! is advisory evidence only, never a finding by itself.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::ScannerError;
use crate::http_client::SmartClient;

const SAMPLES: usize = 5;
const RATIO_THRESHOLD: f64 = 1.5;
const SAMPLE_SPACING: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct TimingResult {
    pub url: String,
    pub valid_median: Duration,
    pub invalid_median: Duration,
    pub difference: Duration,
    pub is_anomaly: bool,
    /// 0-100, how far past the ratio threshold the anomaly sits.
    pub confidence: f64,
}

pub struct BlindIdorDetector<'a> {
    client: &'a SmartClient,
    samples: usize,
    threshold: f64,
}

impl<'a> BlindIdorDetector<'a> {
    pub fn new(client: &'a SmartClient) -> Self {
        Self {
            client,
            samples: SAMPLES,
            threshold: RATIO_THRESHOLD,
        }
    }

    /// Compare median response times of a valid and an invalid URL.
    pub async fn detect_by_timing(
        &self,
        valid_url: &str,
        invalid_url: &str,
        cancel: &CancellationToken,
    ) -> Result<TimingResult, ScannerError> {
        let valid_times = self.sample(valid_url, cancel).await?;
        let invalid_times = self.sample(invalid_url, cancel).await?;

        let valid_median = median(&valid_times);
        let invalid_median = median(&invalid_times);
        let difference = if valid_median > invalid_median {
            valid_median - invalid_median
        } else {
            invalid_median - valid_median
        };

        let mut result = TimingResult {
            url: valid_url.to_string(),
            valid_median,
            invalid_median,
            difference,
            is_anomaly: false,
            confidence: 0.0,
        };

        if !valid_median.is_zero() && !invalid_median.is_zero() {
            let ratio = valid_median.as_secs_f64() / invalid_median.as_secs_f64();
            if ratio > self.threshold || ratio < 1.0 / self.threshold {
                result.is_anomaly = true;
                result.confidence = timing_confidence(ratio, self.threshold);
                debug!(
                    "Timing anomaly on {}: valid={:?} invalid={:?} ratio={:.2}",
                    valid_url, valid_median, invalid_median, ratio
                );
            }
        }

        Ok(result)
    }

    async fn sample(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Duration>, ScannerError> {
        let mut times = Vec::with_capacity(self.samples);

        for _ in 0..self.samples {
            if cancel.is_cancelled() {
                return Err(ScannerError::Cancelled);
            }

            if let Ok(response) = self.client.get(url).await {
                times.push(Duration::from_millis(response.duration_ms));
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ScannerError::Cancelled),
                () = tokio::time::sleep(SAMPLE_SPACING) => {}
            }
        }

        Ok(times)
    }
}

fn median(times: &[Duration]) -> Duration {
    if times.is_empty() {
        return Duration::ZERO;
    }
    let mut sorted = times.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2
    } else {
        sorted[mid]
    }
}

fn timing_confidence(ratio: f64, threshold: f64) -> f64 {
    let diff = if ratio < 1.0 { 1.0 / ratio } else { ratio };
    (((diff - 1.0) / (threshold - 1.0)) * 100.0).min(100.0)
}
