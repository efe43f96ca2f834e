// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Response Comparator
 * Cheap response similarity against a captured baseline
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::http_client::HttpResponse;

/// Outcome of comparing a response against the captured baseline.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonResult {
    pub status_match: bool,
    pub length_diff: usize,
    /// 0.0 (completely different) to 1.0 (identical size).
    pub similarity: f64,
}

/// Holds one baseline response and scores others against it.
///
/// Similarity is a length-ratio proxy, not an edit distance: under worker
/// fanout the comparator runs on every response, and full-body Levenshtein
/// would dominate total CPU. Callers that need the real thing use
/// [`levenshtein_similarity`].
pub struct ResponseComparator {
    baseline: HttpResponse,
}

impl ResponseComparator {
    pub fn new(baseline: HttpResponse) -> Self {
        Self { baseline }
    }

    pub fn baseline(&self) -> &HttpResponse {
        &self.baseline
    }

    pub fn compare(&self, other: &HttpResponse) -> ComparisonResult {
        let baseline_len = self.baseline.body.len();
        let other_len = other.body.len();
        let length_diff = baseline_len.abs_diff(other_len);

        let similarity = if baseline_len > 0 {
            1.0 - (length_diff as f64 / baseline_len as f64).min(1.0)
        } else if other_len == 0 {
            1.0
        } else {
            0.0
        };

        ComparisonResult {
            status_match: self.baseline.status_code == other.status_code,
            length_diff,
            similarity,
        }
    }
}

/// True Levenshtein-based similarity over two strings, normalized to
/// [0, 1]. Exposed for callers that explicitly want deep comparison.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(a, b) as f64 / max_len as f64)
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
