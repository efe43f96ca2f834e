// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Shared helpers: wordlist loading, restricted file writes, URL and
//! cookie-string handling.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write content to a file readable and writable by the owner only.
///
/// Reports and endpoint dumps can contain session tokens and PII, so every
/// file this tool produces is created with mode 0600.
pub fn write_file_restricted(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;

    // A pre-existing file keeps its old mode; clamp it explicitly.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms)
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }

    file.write_all(data)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Load a newline-delimited wordlist, skipping blanks and `#` comments.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read wordlist {}", path.display()))?;

    let payloads: Vec<String> = data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    Ok(payloads)
}

/// Extract the last path segment of a URL, used as the sample identifier
/// when the target has no `{ID}` placeholder.
pub fn extract_id_from_url(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    let trimmed = without_query.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or("").to_string()
}

/// Substitute a payload into the target URL. A literal `{ID}` is replaced
/// once; without a placeholder the payload is appended as a path segment.
pub fn substitute_payload(url: &str, payload: &str) -> String {
    if url.contains("{ID}") {
        return url.replacen("{ID}", payload, 1);
    }
    if url.ends_with('/') {
        format!("{}{}", url, payload)
    } else {
        format!("{}/{}", url, payload)
    }
}

/// Parse a `k=v; k2=v2` cookie string into ordered pairs. Malformed
/// fragments (no `=`) are skipped.
pub fn parse_cookie_string(cookie_str: &str) -> Vec<(String, String)> {
    cookie_str
        .split(';')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let (name, value) = part.split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Join cookie pairs back into a `Cookie:` header value.
pub fn cookie_header_value(cookies: &[(String, String)]) -> String {
    cookies
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse `Name: value` header arguments from the CLI.
pub fn parse_header_args(headers: &[String]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for header in headers {
        if let Some((name, value)) = header.split_once(':') {
            map.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

/// Truncate a string to `max_len` bytes on a char boundary, appending a
/// marker when content was cut.
pub fn truncate_evidence(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_placeholder() {
        assert_eq!(
            substitute_payload("http://x/api/u/{ID}/profile", "42"),
            "http://x/api/u/42/profile"
        );
    }

    #[test]
    fn test_substitute_append() {
        assert_eq!(substitute_payload("http://x/api/u", "42"), "http://x/api/u/42");
        assert_eq!(substitute_payload("http://x/api/u/", "42"), "http://x/api/u/42");
    }

    #[test]
    fn test_substitute_replaces_once() {
        assert_eq!(
            substitute_payload("http://x/{ID}/{ID}", "1"),
            "http://x/1/{ID}"
        );
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(extract_id_from_url("http://x/api/users/123"), "123");
        assert_eq!(extract_id_from_url("http://x/api/users/123/"), "123");
        assert_eq!(extract_id_from_url("http://x/api/users/123?full=1"), "123");
    }

    #[test]
    fn test_cookie_round_trip() {
        let parsed = parse_cookie_string("session=abc; theme=dark;  broken ; token=x=y");
        assert_eq!(
            parsed,
            vec![
                ("session".to_string(), "abc".to_string()),
                ("theme".to_string(), "dark".to_string()),
                ("token".to_string(), "x=y".to_string()),
            ]
        );
        assert_eq!(
            cookie_header_value(&parsed),
            "session=abc; theme=dark; token=x=y"
        );
    }

    #[test]
    fn test_truncate_evidence() {
        assert_eq!(truncate_evidence("short", 1000), "short");
        let long = "a".repeat(1200);
        let cut = truncate_evidence(&long, 1000);
        assert!(cut.ends_with("...[truncated]"));
        assert_eq!(cut.len(), 1000 + "...[truncated]".len());
    }

    #[test]
    fn test_wordlist_loading() {
        let dir = std::env::temp_dir().join("idorplus_wordlist_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ids.txt");
        std::fs::write(&path, "1\n\n# comment\n  42  \nadmin\n").unwrap();

        let payloads = load_wordlist(&path).unwrap();
        assert_eq!(payloads, vec!["1", "42", "admin"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_restricted_write_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join("idorplus_perm_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.json");

        write_file_restricted(&path, b"{}").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
