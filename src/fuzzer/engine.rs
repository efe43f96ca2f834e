// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Fuzzing Engine
 * Bounded worker pool with rate limiting, retries and graceful cancellation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::detector::{DetectionResult, IdorDetector};
use crate::fuzzer::ScanStats;
use crate::http_client::{HttpMethod, HttpResponse, SmartClient};

/// One probe: immutable after submission, consumed by exactly one worker.
#[derive(Debug, Clone)]
pub struct FuzzJob {
    pub id: u64,
    pub url: String,
    pub method: HttpMethod,
    pub payload: String,
    pub body: Option<String>,
    pub headers: HashMap<String, String>,
    pub session: Option<String>,
}

/// Outcome of one job. Produced by exactly one worker.
#[derive(Debug)]
pub struct FuzzResult {
    pub job: FuzzJob,
    /// Final HTTP status; None on transport failure.
    pub status_code: Option<u16>,
    pub content_length: usize,
    pub is_vulnerable: bool,
    pub evidence: String,
    pub detection: Option<DetectionResult>,
    pub error: Option<String>,
    pub duration: Duration,
}

impl FuzzResult {
    fn from_error(job: FuzzJob, error: String, duration: Duration) -> Self {
        Self {
            job,
            status_code: None,
            content_length: 0,
            is_vulnerable: false,
            evidence: String::new(),
            detection: None,
            error: Some(error),
            duration,
        }
    }
}

/// Error text carried by results whose job was interrupted by `Cancel`.
const CANCELLED_MARKER: &str = "Operation cancelled";

type SharedJobReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<FuzzJob>>>;

/// The scan engine: W workers pull jobs from a bounded queue, dispatch
/// them through the shared client and push results onto a bounded result
/// channel. Job order across workers is not preserved; results carry
/// their job id so consumers can re-order.
pub struct FuzzEngine {
    client: Arc<SmartClient>,
    detector: Option<Arc<IdorDetector>>,
    workers: usize,
    max_retries: u32,
    stats: Arc<ScanStats>,
    cancel: CancellationToken,
    job_tx: Mutex<Option<mpsc::Sender<FuzzJob>>>,
    job_rx: SharedJobReceiver,
    result_tx: Mutex<Option<mpsc::Sender<FuzzResult>>>,
    result_rx: Mutex<Option<mpsc::Receiver<FuzzResult>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    started: Mutex<bool>,
}

impl FuzzEngine {
    pub fn new(
        client: Arc<SmartClient>,
        workers: usize,
        detector: Option<Arc<IdorDetector>>,
        max_retries: u32,
    ) -> Self {
        let workers = workers.max(1);
        let capacity = (workers * 10).max(100);

        let (job_tx, job_rx) = mpsc::channel(capacity);
        let (result_tx, result_rx) = mpsc::channel(capacity);

        Self {
            client,
            detector,
            workers,
            max_retries,
            stats: Arc::new(ScanStats::new()),
            cancel: CancellationToken::new(),
            job_tx: Mutex::new(Some(job_tx)),
            job_rx: Arc::new(tokio::sync::Mutex::new(job_rx)),
            result_tx: Mutex::new(Some(result_tx)),
            result_rx: Mutex::new(Some(result_rx)),
            handles: Mutex::new(Vec::new()),
            started: Mutex::new(false),
        }
    }

    pub fn stats(&self) -> Arc<ScanStats> {
        Arc::clone(&self.stats)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn the worker pool. Safe to call once; repeated calls are no-ops.
    pub fn start(&self) {
        let mut started = self.started.lock().unwrap();
        if *started {
            return;
        }
        *started = true;

        let result_tx = match self.result_tx.lock().unwrap().clone() {
            Some(tx) => tx,
            None => return,
        };

        let mut handles = self.handles.lock().unwrap();
        for worker_id in 0..self.workers {
            let client = Arc::clone(&self.client);
            let detector = self.detector.clone();
            let stats = Arc::clone(&self.stats);
            let cancel = self.cancel.clone();
            let job_rx = Arc::clone(&self.job_rx);
            let result_tx = result_tx.clone();
            let max_retries = self.max_retries;

            handles.push(tokio::spawn(async move {
                worker_loop(
                    worker_id, client, detector, stats, cancel, job_rx, result_tx, max_retries,
                )
                .await;
            }));
        }
        debug!("Fuzz engine started with {} workers", self.workers);
    }

    /// Enqueue a job, blocking while the queue is full. Returns false once
    /// cancellation has been requested or the queue is closed.
    pub async fn submit(&self, job: FuzzJob) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        let tx = match self.job_tx.lock().unwrap().clone() {
            Some(tx) => tx,
            None => return false,
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            sent = tx.send(job) => sent.is_ok(),
        }
    }

    /// Take the result stream. Single consumer; returns None on repeat calls.
    pub fn take_results(&self) -> Option<mpsc::Receiver<FuzzResult>> {
        self.result_rx.lock().unwrap().take()
    }

    /// Close the job queue after the last submission. Idempotent.
    pub fn close_queue(&self) {
        self.job_tx.lock().unwrap().take();
    }

    /// Wait for every worker to drain, then close the result channel.
    /// Idempotent; safe to call after `cancel`.
    pub async fn wait_and_close(&self) {
        let handles: Vec<JoinHandle<()>> = self.handles.lock().unwrap().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        self.result_tx.lock().unwrap().take();
    }

    /// Fire the cancellation token. Sticky: no new jobs are accepted and
    /// every blocking operation in the pool unwinds promptly. In-flight
    /// jobs may still emit one final (possibly cancellation-marked) result.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    worker_id: usize,
    client: Arc<SmartClient>,
    detector: Option<Arc<IdorDetector>>,
    stats: Arc<ScanStats>,
    cancel: CancellationToken,
    job_rx: SharedJobReceiver,
    result_tx: mpsc::Sender<FuzzResult>,
    max_retries: u32,
) {
    loop {
        let job = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            job = async { job_rx.lock().await.recv().await } => match job {
                Some(job) => job,
                // Queue closed and drained.
                None => break,
            },
        };

        let result = process_job(
            &client,
            detector.as_deref(),
            &stats,
            &cancel,
            job,
            max_retries,
        )
        .await;

        let was_cancelled = result.error.as_deref() == Some(CANCELLED_MARKER);

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            sent = result_tx.send(result) => {
                if sent.is_err() {
                    break;
                }
            }
        }

        if was_cancelled {
            break;
        }
    }

    debug!("Worker {} exiting", worker_id);
}

/// Execute one job with up to `max_retries` attempts and linear backoff
/// (attempt x 1 s) between them.
async fn process_job(
    client: &SmartClient,
    detector: Option<&IdorDetector>,
    stats: &ScanStats,
    cancel: &CancellationToken,
    job: FuzzJob,
    max_retries: u32,
) -> FuzzResult {
    let start = Instant::now();
    let mut response: Option<HttpResponse> = None;
    let mut last_error: Option<String> = None;

    let attempts = max_retries.max(1);
    for attempt in 1..=attempts {
        if cancel.is_cancelled() {
            return FuzzResult::from_error(job, CANCELLED_MARKER.into(), start.elapsed());
        }

        if client.rate_limiter().acquire(cancel).await.is_err() {
            return FuzzResult::from_error(job, CANCELLED_MARKER.into(), start.elapsed());
        }

        match client
            .execute(
                job.method,
                &job.url,
                &job.headers,
                job.session.as_deref(),
                job.body.as_deref(),
            )
            .await
        {
            Ok(resp) => {
                response = Some(resp);
                break;
            }
            Err(err) => {
                debug!(
                    "Job {} attempt {}/{} failed: {}",
                    job.id, attempt, attempts, err
                );
                last_error = Some(err.to_string());

                if attempt < attempts {
                    let backoff = Duration::from_secs(attempt as u64);
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            return FuzzResult::from_error(
                                job,
                                CANCELLED_MARKER.into(),
                                start.elapsed(),
                            );
                        }
                        () = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }
    }

    stats.record_request();

    let response = match response {
        Some(resp) => {
            stats.increment_success();
            resp
        }
        None => {
            stats.increment_failed();
            return FuzzResult::from_error(
                job,
                last_error.unwrap_or_else(|| "request failed".into()),
                start.elapsed(),
            );
        }
    };

    let detection = detector.map(|d| d.detect_with_evidence(&response));
    let is_vulnerable = detection.as_ref().map(|d| d.is_vulnerable).unwrap_or(false);
    if is_vulnerable {
        stats.increment_vuln();
    }

    FuzzResult {
        job,
        status_code: Some(response.status_code),
        content_length: response.body.len(),
        is_vulnerable,
        evidence: response.body,
        detection,
        error: None,
        duration: start.elapsed(),
    }
}
