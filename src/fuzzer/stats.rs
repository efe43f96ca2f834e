// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Statistics
 * Process-wide atomic counters for live progress reporting
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters shared by all workers. Counts are atomic; the last-request
/// timestamp takes a writer lock because `Instant` writes are not
/// lock-free on every target.
pub struct ScanStats {
    total: AtomicU64,
    success: AtomicU64,
    failed: AtomicU64,
    vuln: AtomicU64,
    start_time: Instant,
    last_request: RwLock<Instant>,
}

impl ScanStats {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            vuln: AtomicU64::new(0),
            start_time: now,
            last_request: RwLock::new(now),
        }
    }

    pub fn record_request(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self.last_request.write() = Instant::now();
    }

    pub fn increment_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_vuln(&self) {
        self.vuln.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn success(&self) -> u64 {
        self.success.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn vuln_count(&self) -> u64 {
        self.vuln.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn last_request_age(&self) -> Duration {
        self.last_request.read().elapsed()
    }

    /// Requests per second since the scan started.
    pub fn rps(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed == 0.0 {
            return 0.0;
        }
        self.total() as f64 / elapsed
    }

    /// Compact one-line summary for log output.
    pub fn summary(&self) -> String {
        format!(
            "Requests: {} | Vulns: {} | RPS: {:.1} | Time: {:.0?}",
            self.total(),
            self.vuln_count(),
            self.rps(),
            self.elapsed()
        )
    }
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}
