// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Payload Generation
 * Ordered candidate identifiers driven by detected ID type
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

mod encoding;
mod numeric;
mod uuid_gen;

pub use encoding::EncodingEngine;
pub use numeric::NumericGenerator;
pub use uuid_gen::UuidGenerator;

use crate::analyzer::IdType;
use tracing::debug;

/// Produces the ordered payload sequence for a scan. Position conveys
/// priority: duplicates between the sequential range and the boundary set
/// are kept on purpose.
pub struct PayloadGenerator {
    id_type: IdType,
    numeric: NumericGenerator,
    uuid: UuidGenerator,
    encoder: EncodingEngine,
    encodings: Vec<String>,
}

impl PayloadGenerator {
    pub fn new(id_type: IdType) -> Self {
        Self {
            id_type,
            numeric: NumericGenerator::new(),
            uuid: UuidGenerator::new(),
            encoder: EncodingEngine::new(),
            encodings: Vec::new(),
        }
    }

    /// Request each base payload re-emitted under the given transforms,
    /// in order, after the original.
    pub fn with_encodings(mut self, encodings: Vec<String>) -> Self {
        self.encodings = encodings;
        self
    }

    pub fn generate(&self, count: usize) -> Vec<String> {
        let base = match self.id_type {
            IdType::Uuid => self.uuid.generate(count),
            // Hash, base64 and unknown forms fall back to numeric probing.
            _ => self.numeric.generate(count),
        };

        debug!(
            "Generated {} base payloads for id type {}",
            base.len(),
            self.id_type
        );

        if self.encodings.is_empty() {
            return base;
        }

        let mut out = Vec::with_capacity(base.len() * (1 + self.encodings.len()));
        for payload in &base {
            out.push(payload.clone());
            for method in &self.encodings {
                out.push(self.encoder.encode(payload, method));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_falls_back_to_numeric() {
        let payloads = PayloadGenerator::new(IdType::Unknown).generate(5);
        assert_eq!(&payloads[..5], &["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_encoded_output_order() {
        let generator = PayloadGenerator::new(IdType::Numeric)
            .with_encodings(vec!["base64".to_string(), "hex".to_string()]);
        let payloads = generator.generate(1);

        // original, base64, hex for each base payload
        assert_eq!(payloads[0], "1");
        assert_eq!(payloads[1], "MQ==");
        assert_eq!(payloads[2], "31");
    }
}
