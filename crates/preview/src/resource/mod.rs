// ABOUTME: Fetch collaborator: the Fetcher trait and a reqwest-backed HttpFetcher.
// ABOUTME: Handles SSRF protection, content-length limits, charset decoding and bounded retry.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ipnet::{Ipv4Net, Ipv6Net};
use once_cell::sync::Lazy;
use tracing::{debug, warn};
use url::Url;

use crate::error::PreviewError;
use crate::options::Options;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

const OP: &str = "Fetch";

/// Redirect hops followed before a fetch gives up.
const MAX_REDIRECTS: usize = 10;

static PRIVATE_V4: Lazy<Vec<Ipv4Net>> = Lazy::new(|| {
    ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "127.0.0.0/8", "169.254.0.0/16", "0.0.0.0/8"]
        .iter()
        .map(|n| n.parse().unwrap())
        .collect()
});

static PRIVATE_V6: Lazy<Vec<Ipv6Net>> =
    Lazy::new(|| ["fc00::/7", "fe80::/10"].iter().map(|n| n.parse().unwrap()).collect());

/// Supplies raw page text for a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, PreviewError>;
}

/// Check if an IP address is in a private/reserved range.
pub(crate) fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => PRIVATE_V4.iter().any(|net| net.contains(ip)),
        IpAddr::V6(ip) => {
            if ip.is_loopback() || ip.is_unspecified() {
                return true;
            }
            if let Some(v4) = ip.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(v4));
            }
            PRIVATE_V6.iter().any(|net| net.contains(ip))
        }
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
pub(crate) fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|c| encoding_rs::Encoding::for_label(c.as_bytes()))
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
pub(crate) fn extract_charset(content_type: &str) -> Option<String> {
    content_type.to_lowercase().split(';').find_map(|part| {
        part.trim()
            .strip_prefix("charset=")
            .map(|c| c.trim_matches('"').trim_matches('\'').to_string())
    })
}

/// Validate scheme and refuse private targets. Hostnames are resolved and every address checked.
async fn guard_target(parsed: &Url, url: &str, allow_private: bool) -> Result<(), PreviewError> {
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(PreviewError::invalid_url(
            url,
            OP,
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }
    if allow_private {
        return Ok(());
    }
    let Some(host) = parsed.host_str() else {
        return Err(PreviewError::invalid_url(url, OP, Some(anyhow::anyhow!("missing host"))));
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(&ip) {
            return Err(PreviewError::blocked(
                url,
                OP,
                Some(anyhow::anyhow!("private IP addresses are not allowed")),
            ));
        }
        return Ok(());
    }

    let port = parsed.port_or_known_default().unwrap_or(80);
    let addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
        PreviewError::network(url, OP, Some(anyhow::anyhow!("DNS lookup failed: {}", e)))
    })?;
    for socket_addr in addrs {
        if is_private_ip(&socket_addr.ip()) {
            return Err(PreviewError::blocked(
                url,
                OP,
                Some(anyhow::anyhow!("host resolves to a private IP address")),
            ));
        }
    }
    Ok(())
}

fn map_request_error(url: &str, e: reqwest::Error) -> PreviewError {
    if e.is_timeout() {
        PreviewError::timeout(url, OP, Some(anyhow::anyhow!("request timed out: {}", e)))
    } else if e.is_redirect() {
        PreviewError::blocked(url, OP, Some(anyhow::anyhow!("redirect refused: {}", e)))
    } else {
        PreviewError::network(url, OP, Some(anyhow::anyhow!("request failed: {}", e)))
    }
}

/// reqwest-backed fetcher with SSRF protection and retry.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    headers: HashMap<String, String>,
    allow_private_networks: bool,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl HttpFetcher {
    pub fn new(opts: &Options) -> Result<Self, PreviewError> {
        let client = match opts.http_client.clone() {
            Some(client) => client,
            None => reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .map_err(|e| {
                    PreviewError::network("", OP, Some(anyhow::anyhow!("failed to build HTTP client: {}", e)))
                })?,
        };
        Ok(Self {
            client,
            headers: opts.headers.clone(),
            allow_private_networks: opts.allow_private_networks,
            max_attempts: opts.max_attempts.max(1),
            retry_backoff: opts.retry_backoff,
        })
    }

    /// Send a GET, following redirects by hand so every hop passes `guard_target`.
    async fn send_guarded(&self, url: &str, parsed: &Url) -> Result<reqwest::Response, PreviewError> {
        let mut target = parsed.clone();
        for _ in 0..=MAX_REDIRECTS {
            guard_target(&target, url, self.allow_private_networks).await?;

            let mut request = self.client.get(target.as_str());
            for (key, value) in &self.headers {
                request = request.header(key, value);
            }
            let response = request.send().await.map_err(|e| map_request_error(url, e))?;
            if !response.status().is_redirection() {
                return Ok(response);
            }
            let Some(location) = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return Ok(response);
            };
            let next = target.join(location).map_err(|e| {
                PreviewError::invalid_url(url, OP, Some(anyhow::anyhow!("bad redirect location: {}", e)))
            })?;
            debug!(url, from = %target, to = %next, "following redirect");
            target = next;
        }
        Err(PreviewError::fetch(
            url,
            OP,
            None,
            Some(anyhow::anyhow!("more than {} redirects", MAX_REDIRECTS)),
        ))
    }

    async fn fetch_once(&self, url: &str, parsed: &Url) -> Result<String, PreviewError> {
        let response = self.send_guarded(url, parsed).await?;

        if response.content_length().is_some_and(|len| len as usize > MAX_CONTENT_LENGTH) {
            return Err(PreviewError::fetch(
                url,
                OP,
                None,
                Some(anyhow::anyhow!("content too large")),
            ));
        }

        let status = response.status();
        if !status.is_success() {
            return Err(PreviewError::fetch(
                url,
                OP,
                Some(status.as_u16()),
                Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_lowercase);

        let body: Bytes = response.bytes().await.map_err(|e| map_request_error(url, e))?;
        if body.len() > MAX_CONTENT_LENGTH {
            return Err(PreviewError::fetch(
                url,
                OP,
                None,
                Some(anyhow::anyhow!("content too large")),
            ));
        }

        Ok(decode_body(&body, content_type.as_deref()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PreviewError> {
        let parsed = Url::parse(url.trim()).map_err(|e| {
            PreviewError::invalid_url(url, OP, Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;

        let mut backoff = self.retry_backoff;
        let mut attempt = 1;
        loop {
            match self.fetch_once(url, &parsed).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    debug!(url, attempt, error = %e, "retrying fetch");
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "fetch failed");
                    return Err(e);
                }
            }
        }
    }
}
