// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Concurrent fuzzing engine: bounded job/result queues, worker pool,
//! cooperative cancellation and live statistics.

mod engine;
mod stats;

pub use engine::{FuzzEngine, FuzzJob, FuzzResult};
pub use stats::ScanStats;
