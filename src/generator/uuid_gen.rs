// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Time-based and random UUID payloads.
//!
//! Version 1 UUIDs embed their creation timestamp, so a server issuing
//! them is probeable by guessing nearby timestamps. Emitting a batch of
//! fresh v1 values samples that neighborhood; the v4 half establishes the
//! random-space baseline.

use rand::Rng;
use std::time::Duration;
use uuid::timestamp::context::Context;
use uuid::{Timestamp, Uuid};

pub struct UuidGenerator {
    node_id: [u8; 6],
    context: Context,
}

impl UuidGenerator {
    pub fn new() -> Self {
        let mut node_id = [0u8; 6];
        rand::rng().fill(&mut node_id[..]);
        // Multicast bit set per RFC 4122 for randomly generated node ids.
        node_id[0] |= 0x01;

        Self {
            node_id,
            context: Context::new(rand::rng().random()),
        }
    }

    /// count/2 time-based v1 values with at least 10 µs between them so
    /// the time component varies, then count/2 random v4 values.
    pub fn generate(&self, count: usize) -> Vec<String> {
        let mut payloads = Vec::with_capacity(count);

        for _ in 0..count / 2 {
            let ts = Timestamp::now(&self.context);
            payloads.push(Uuid::new_v1(ts, &self.node_id).to_string());
            std::thread::sleep(Duration::from_micros(10));
        }

        for _ in 0..count / 2 {
            payloads.push(Uuid::new_v4().to_string());
        }

        payloads
    }
}

impl Default for UuidGenerator {
    fn default() -> Self {
        Self::new()
    }
}
