// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Payload Encoding Engine
 * Re-emits payloads under filter-evasion transforms
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

#[derive(Debug, Default)]
pub struct EncodingEngine;

impl EncodingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Apply one named transform. Unrecognized names return the payload
    /// unchanged.
    pub fn encode(&self, payload: &str, method: &str) -> String {
        match method {
            "url" => url_encode(payload),
            "double_url" => url_encode(&url_encode(payload)),
            "base64" => BASE64.encode(payload.as_bytes()),
            "hex" => hex::encode(payload.as_bytes()),
            "unicode" => unicode_escape(payload),
            "json_wrap" => format!("{{\"id\":\"{}\"}}", payload),
            "array" => format!("[\"{}\"]", payload),
            _ => payload.to_string(),
        }
    }

    /// Names of all supported transforms.
    pub fn supported() -> &'static [&'static str] {
        &[
            "url",
            "double_url",
            "base64",
            "hex",
            "unicode",
            "json_wrap",
            "array",
        ]
    }
}

fn url_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn unicode_escape(s: &str) -> String {
    s.chars().map(|c| format!("\\u{:04x}", c as u32)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_round_trip() {
        let engine = EncodingEngine::new();
        let encoded = engine.encode("test", "base64");
        assert_eq!(encoded, "dGVzdA==");
        assert_eq!(BASE64.decode(&encoded).unwrap(), b"test");
    }

    #[test]
    fn test_hex_round_trip() {
        let engine = EncodingEngine::new();
        let encoded = engine.encode("AB", "hex");
        assert_eq!(encoded, "4142");
        assert_eq!(hex::decode(&encoded).unwrap(), b"AB");
    }

    #[test]
    fn test_url_encoding() {
        let engine = EncodingEngine::new();
        assert_eq!(engine.encode("a b/c", "url"), "a%20b%2Fc");
        assert_eq!(engine.encode("a b", "double_url"), "a%2520b");
    }

    #[test]
    fn test_unicode_escape() {
        let engine = EncodingEngine::new();
        assert_eq!(engine.encode("1a", "unicode"), "\\u0031\\u0061");
    }

    #[test]
    fn test_wrappers() {
        let engine = EncodingEngine::new();
        assert_eq!(engine.encode("123", "json_wrap"), "{\"id\":\"123\"}");
        assert_eq!(engine.encode("123", "array"), "[\"123\"]");
    }

    #[test]
    fn test_unknown_method_passthrough() {
        let engine = EncodingEngine::new();
        assert_eq!(engine.encode("test", "rot13"), "test");
    }

    #[test]
    fn test_supported_transforms_change_output() {
        let engine = EncodingEngine::new();
        for method in EncodingEngine::supported() {
            assert_ne!(engine.encode("a b", method), "a b", "method {}", method);
        }
    }
}
