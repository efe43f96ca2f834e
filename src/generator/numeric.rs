// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Sequential and boundary-value numeric identifiers.

/// Boundary ids appended after the sequential range. Off-by-one pairs
/// around common page sizes plus the i32 extremes.
const BOUNDARY_VALUES: &[&str] = &[
    "0",
    "1",
    "-1",
    "999",
    "1000",
    "1001",
    "9999",
    "10000",
    "2147483647",
    "-2147483648",
];

#[derive(Debug, Default)]
pub struct NumericGenerator;

impl NumericGenerator {
    pub fn new() -> Self {
        Self
    }

    /// 1..=count in order, then the boundary set. Duplicates with the
    /// sequential range are not removed; position conveys priority.
    pub fn generate(&self, count: usize) -> Vec<String> {
        let mut payloads = Vec::with_capacity(count + BOUNDARY_VALUES.len());

        for i in 1..=count {
            payloads.push(i.to_string());
        }

        payloads.extend(BOUNDARY_VALUES.iter().map(|s| s.to_string()));

        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_prefix() {
        let payloads = NumericGenerator::new().generate(10);
        for (i, expected) in ["1", "2", "3", "4", "5"].iter().enumerate() {
            assert_eq!(&payloads[i], expected);
        }
    }

    #[test]
    fn test_boundaries_after_sequence() {
        let count = 25;
        let payloads = NumericGenerator::new().generate(count);
        assert_eq!(payloads.len(), count + BOUNDARY_VALUES.len());
        assert_eq!(&payloads[count..], BOUNDARY_VALUES);
    }

    #[test]
    fn test_duplicates_preserved() {
        // "1" appears both at position 0 and inside the boundary set.
        let payloads = NumericGenerator::new().generate(10);
        assert_eq!(payloads.iter().filter(|p| p.as_str() == "1").count(), 2);
    }
}
