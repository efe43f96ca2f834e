// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Vulnerability detection: baseline-differential response classification,
//! cross-session authorization probing, and timing-based blind checks.

mod auth_matrix;
mod blind;
mod idor;

pub use auth_matrix::{AuthMatrixTester, MatrixResult, SessionProbe};
pub use blind::{BlindIdorDetector, TimingResult};
pub use idor::{DetectionResult, IdorDetector};
