// ABOUTME: Configuration options for the preview pipeline and the fluent PipelineBuilder.
// ABOUTME: Covers extraction quotas, the reading-time toggle, cache sizing and fetch behaviour.

use std::collections::HashMap;
use std::time::Duration;

use crate::pipeline::Pipeline;

/// Shortest TTL a cache may be configured with.
pub const MIN_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Longest TTL a cache may be configured with.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Configuration options for a preview pipeline.
#[derive(Debug, Clone)]
pub struct Options {
    pub max_images: usize,
    pub max_sentences: usize,
    pub max_chars: usize,
    /// Attach reading time to article previews.
    pub include_reading_time: bool,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    /// Per-attempt fetch timeout.
    pub timeout: Duration,
    /// Total fetch attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later one.
    pub retry_backoff: Duration,
    pub user_agent: String,
    pub allow_private_networks: bool,
    pub headers: HashMap<String, String>,
    pub http_client: Option<reqwest::Client>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_images: 5,
            max_sentences: 3,
            max_chars: 280,
            include_reading_time: true,
            cache_ttl: Duration::from_secs(15 * 60),
            cache_capacity: 50,
            timeout: Duration::from_secs(5),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(250),
            user_agent: "DigestsPreview/1.0".to_string(),
            allow_private_networks: false,
            headers: HashMap::new(),
            http_client: None,
        }
    }
}

impl Options {
    /// The configured TTL forced into the supported range.
    pub fn clamped_cache_ttl(&self) -> Duration {
        self.cache_ttl.clamp(MIN_CACHE_TTL, MAX_CACHE_TTL)
    }
}

/// Builder for constructing Pipeline instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    opts: Options,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of images per preview.
    pub fn max_images(mut self, max_images: usize) -> Self {
        self.opts.max_images = max_images;
        self
    }

    /// Sentence budget for summaries.
    pub fn max_sentences(mut self, max_sentences: usize) -> Self {
        self.opts.max_sentences = max_sentences;
        self
    }

    /// Character budget for summaries.
    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.opts.max_chars = max_chars;
        self
    }

    pub fn include_reading_time(mut self, include: bool) -> Self {
        self.opts.include_reading_time = include;
        self
    }

    /// Cache TTL, clamped to 5..=60 minutes when the pipeline is built.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.opts.cache_ttl = ttl;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.opts.cache_capacity = capacity;
        self
    }

    /// Set the per-attempt request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the total number of fetch attempts (minimum 1).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.opts.max_attempts = attempts.max(1);
        self
    }

    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.opts.retry_backoff = backoff;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Allow or disallow requests to private networks.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        self.opts.allow_private_networks = allow;
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// The options gathered so far.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn build(self) -> Pipeline {
        Pipeline::new(self.opts)
    }
}
