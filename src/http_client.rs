// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Evasion-Aware HTTP Transport
 * Shared client with browser-like TLS, connection pooling and proxy rotation
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::Config;
use crate::errors::ScannerError;
use crate::proxy::ProxyManager;
use crate::rate_limiter::RateLimiter;
use crate::session::SessionManager;
use crate::waf_bypass::{BypassMode, WafBypass};

/// Maximum response body retained per request. Larger bodies are truncated
/// on a char boundary; content length is still reported from the full size.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const POOL_MAX_IDLE_PER_HOST: usize = 10;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Closed set of HTTP methods the fuzzer dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured response snapshot. Bodies are owned strings so baselines and
/// results can be shared between detector and reporter without lifetimes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Shared HTTP client wiring together the evasion policy, the session
/// registry, rate limiting and proxy rotation.
pub struct SmartClient {
    client: Client,
    waf: WafBypass,
    sessions: SessionManager,
    rate_limiter: Arc<RateLimiter>,
    default_headers: HashMap<String, String>,
}

impl SmartClient {
    pub fn new(
        config: &Config,
        sessions: SessionManager,
        proxies: Arc<ProxyManager>,
    ) -> Result<Self, ScannerError> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .redirect(reqwest::redirect::Policy::limited(5))
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .http2_keep_alive_interval(Duration::from_secs(10))
            .http2_keep_alive_timeout(Duration::from_secs(20))
            .danger_accept_invalid_certs(!config.scanner.verify_tls);

        if let Some(proxy) = proxies.proxy_hook() {
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ScannerError::Configuration(format!("HTTP client: {}", e)))?;

        let waf_enabled = config.waf_bypass.enabled;
        let mode = if waf_enabled {
            config.waf_bypass.mode
        } else {
            BypassMode::None
        };
        let waf = WafBypass::new(mode, config.waf_bypass.headers.clone());

        let rps = (config.scanner.threads * 2).max(1) as u32;
        let min_delay = config.delay();
        let max_delay = min_delay * 3;
        let rate_limiter = Arc::new(RateLimiter::new(rps, min_delay, max_delay));

        debug!(
            "Transport ready: timeout={:?}, bypass={}, proxies={}",
            config.timeout(),
            waf.mode(),
            proxies.count()
        );

        Ok(Self {
            client,
            waf,
            sessions,
            rate_limiter,
            default_headers: HashMap::new(),
        })
    }

    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.rate_limiter)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn waf(&self) -> &WafBypass {
        &self.waf
    }

    /// Header applied to every request, e.g. `Authorization: Bearer ...`.
    pub fn set_default_header(&mut self, name: &str, value: &str) {
        self.default_headers
            .insert(name.to_string(), value.to_string());
    }

    /// Dispatch one request. Evasion headers, default headers, the named
    /// session's cookies and any per-job headers are applied in that
    /// order, so job headers win on conflict.
    pub async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        extra_headers: &HashMap<String, String>,
        session: Option<&str>,
        body: Option<&str>,
    ) -> Result<HttpResponse, ScannerError> {
        let mut headers = HeaderMap::new();

        for (name, value) in self.waf.request_headers() {
            insert_header(&mut headers, &name, &value);
        }
        for (name, value) in &self.default_headers {
            insert_header(&mut headers, name, value);
        }
        if let Some(name) = session {
            if let Some(session) = self.sessions.get(name) {
                if let Some(cookie) = session.cookie_header() {
                    insert_header(&mut headers, "Cookie", &cookie);
                }
                for (name, value) in &session.headers {
                    insert_header(&mut headers, name, value);
                }
            }
        }
        for (name, value) in extra_headers {
            insert_header(&mut headers, name, value);
        }

        let mut request = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
            HttpMethod::Patch => self.client.patch(url),
            HttpMethod::Head => self.client.head(url),
            HttpMethod::Options => self.client.request(reqwest::Method::OPTIONS, url),
        }
        .headers(headers);

        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let start = Instant::now();
        let response = request.send().await?;

        let status_code = response.status().as_u16();
        let header_map = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|value| (k.as_str().to_lowercase(), value.to_string()))
            })
            .collect();

        let bytes = response.bytes().await?;
        let body_text = String::from_utf8_lossy(&bytes);
        let body = if body_text.len() > MAX_BODY_SIZE {
            let mut end = MAX_BODY_SIZE;
            while end > 0 && !body_text.is_char_boundary(end) {
                end -= 1;
            }
            body_text[..end].to_string()
        } else {
            body_text.into_owned()
        };

        Ok(HttpResponse {
            status_code,
            body,
            headers: header_map,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Plain GET without session or extra headers.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, ScannerError> {
        self.execute(HttpMethod::Get, url, &HashMap::new(), None, None)
            .await
    }

    /// GET under a named session; used for baselines and matrix probes.
    pub async fn get_with_session(
        &self,
        url: &str,
        session: Option<&str>,
    ) -> Result<HttpResponse, ScannerError> {
        self.execute(HttpMethod::Get, url, &HashMap::new(), session, None)
            .await
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        headers.insert(name, value);
    }
}
