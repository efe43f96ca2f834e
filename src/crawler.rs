// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Bounded Spider
 * Breadth-first crawl feeding the shadow API discoverer
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::http_client::SmartClient;

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r##"(?:href|src)\s*=\s*['"]([^'"#]+)['"]"##).unwrap());

/// A fetched page handed to the caller for endpoint extraction.
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: String,
    pub content_type: String,
    pub body: String,
}

/// Breadth-first spider bounded by depth and page count. Stays on the
/// start URL's host; the crawl feeds discovery, it is not a product of
/// its own.
pub struct Crawler<'a> {
    client: &'a SmartClient,
    pub depth: usize,
    pub max_pages: usize,
}

impl<'a> Crawler<'a> {
    pub fn new(client: &'a SmartClient) -> Self {
        Self {
            client,
            depth: 2,
            max_pages: 50,
        }
    }

    pub async fn crawl(&self, start_url: &str, cancel: &CancellationToken) -> Vec<CrawledPage> {
        let start = match Url::parse(start_url) {
            Ok(url) => url,
            Err(_) => return Vec::new(),
        };
        let host = start.host_str().map(str::to_string);

        let mut visited: HashSet<String> = HashSet::new();
        let mut pages = Vec::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((start_url.to_string(), 0));

        while let Some((url, depth)) = queue.pop_front() {
            if cancel.is_cancelled() || visited.len() >= self.max_pages {
                break;
            }
            if depth > self.depth || !visited.insert(url.clone()) {
                continue;
            }

            if self
                .client
                .rate_limiter()
                .acquire(cancel)
                .await
                .is_err()
            {
                break;
            }

            let response = match self.client.get(&url).await {
                Ok(response) => response,
                Err(err) => {
                    debug!("Crawl fetch failed for {}: {}", url, err);
                    continue;
                }
            };

            let content_type = response
                .header("content-type")
                .unwrap_or("text/html")
                .to_string();

            for link in extract_links(&response.body) {
                if let Some(resolved) = resolve(&url, &link) {
                    let same_host = resolved.host_str().map(str::to_string) == host;
                    if same_host {
                        queue.push_back((resolved.to_string(), depth + 1));
                    }
                }
            }

            pages.push(CrawledPage {
                url,
                content_type,
                body: response.body,
            });
        }

        info!("Crawl finished: {} pages fetched", pages.len());
        pages
    }
}

fn extract_links(body: &str) -> Vec<String> {
    LINK_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|link| {
            !link.starts_with("mailto:")
                && !link.starts_with("javascript:")
                && !link.starts_with('#')
        })
        .collect()
}

fn resolve(base: &str, target: &str) -> Option<Url> {
    let base = Url::parse(base).ok()?;
    base.join(target).ok()
}
