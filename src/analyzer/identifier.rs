// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Identifier Type Analyzer
 * Classifies object identifiers to drive payload generation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// Identifier categories in order of classification precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdType {
    Numeric,
    Uuid,
    Md5,
    Sha1,
    Base64,
    Unknown,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Numeric => "numeric",
            IdType::Uuid => "uuid",
            IdType::Md5 => "md5",
            IdType::Sha1 => "sha1",
            IdType::Base64 => "base64",
            IdType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static HEX32_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-fA-F0-9]{32}$").unwrap());
static HEX40_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-fA-F0-9]{40}$").unwrap());
static BASE64_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").unwrap());

/// Classifies a sample identifier into the category that drives payload
/// generation.
#[derive(Debug, Default)]
pub struct IdentifierAnalyzer;

impl IdentifierAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// First match wins; the categories overlap, so order matters:
    /// numeric is cheapest and most common, a 32-hex string without
    /// dashes must be MD5 before the UUID parser sees it, and base64 is
    /// checked last because its alphabet is the most permissive.
    pub fn detect_type(&self, id: &str) -> IdType {
        if NUMERIC_RE.is_match(id) {
            return IdType::Numeric;
        }

        if HEX32_RE.is_match(id) && !id.contains('-') {
            return IdType::Md5;
        }

        if HEX40_RE.is_match(id) {
            return IdType::Sha1;
        }

        if Uuid::parse_str(id).is_ok() && id.contains('-') {
            return IdType::Uuid;
        }

        if BASE64_RE.is_match(id) && id.len() > 4 {
            return IdType::Base64;
        }

        IdType::Unknown
    }
}
