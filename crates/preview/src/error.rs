// ABOUTME: Error types for the preview pipeline including ErrorCode, PreviewError and FailureCategory.
// ABOUTME: Maps structured codes and free-form failure text to short user-facing explanations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes representing different categories of pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Empty or unusable HTML input.
    Parse,
    /// A single structured-data block could not be parsed.
    SchemaParse,
    /// A type-specific extractor failed.
    Extract,
    InvalidUrl,
    /// The fetch completed with a non-success HTTP status (if known).
    Fetch { status: Option<u16> },
    Timeout,
    /// Request refused before it was sent (private network, mixed content, CORS).
    Blocked,
    Network,
    ContextInvalidated,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Parse => write!(f, "parse error"),
            ErrorCode::SchemaParse => write!(f, "schema parse error"),
            ErrorCode::Extract => write!(f, "extraction error"),
            ErrorCode::InvalidUrl => write!(f, "invalid URL"),
            ErrorCode::Fetch { status: Some(s) } => write!(f, "fetch error (HTTP {})", s),
            ErrorCode::Fetch { status: None } => write!(f, "fetch error"),
            ErrorCode::Timeout => write!(f, "timeout"),
            ErrorCode::Blocked => write!(f, "blocked"),
            ErrorCode::Network => write!(f, "network error"),
            ErrorCode::ContextInvalidated => write!(f, "context invalidated"),
        }
    }
}

/// The main error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub struct PreviewError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl PreviewError {
    fn with_code(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Parse error.
    pub fn parse(url: impl Into<String>, op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::with_code(ErrorCode::Parse, url, op, source)
    }

    /// Create a SchemaParse error.
    pub fn schema_parse(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::SchemaParse, url, op, source)
    }

    /// Create an Extract error.
    pub fn extract(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Extract, url, op, source)
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Fetch error, optionally carrying the HTTP status.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        status: Option<u16>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Fetch { status }, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Timeout, url, op, source)
    }

    /// Create a Blocked error.
    pub fn blocked(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Blocked, url, op, source)
    }

    /// Create a Network error.
    pub fn network(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::Network, url, op, source)
    }

    /// Create a ContextInvalidated error.
    pub fn context_invalidated(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::with_code(ErrorCode::ContextInvalidated, url, op, source)
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a Blocked error.
    pub fn is_blocked(&self) -> bool {
        self.code == ErrorCode::Blocked
    }

    /// Returns true if this is a Fetch error of any status.
    pub fn is_fetch(&self) -> bool {
        matches!(self.code, ErrorCode::Fetch { .. })
    }

    /// Returns true if this is a Network error.
    pub fn is_network(&self) -> bool {
        self.code == ErrorCode::Network
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// HTTP status carried by a Fetch error.
    pub fn status(&self) -> Option<u16> {
        match self.code {
            ErrorCode::Fetch { status } => status,
            _ => None,
        }
    }

    /// Whether a fetch that failed this way is worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self.code {
            ErrorCode::Timeout | ErrorCode::Network => true,
            ErrorCode::Fetch { status: Some(s) } => s >= 500 || s == 429,
            _ => false,
        }
    }

    /// Categorize the failure for display, preferring the structured code.
    pub fn category(&self) -> FailureCategory {
        match self.code {
            ErrorCode::Parse => FailureCategory::EmptyDocument,
            ErrorCode::Timeout => FailureCategory::Timeout,
            ErrorCode::Blocked => FailureCategory::Blocked,
            ErrorCode::Network => FailureCategory::Network,
            ErrorCode::ContextInvalidated => FailureCategory::ContextInvalidated,
            ErrorCode::Fetch { status: Some(404) } => FailureCategory::NotFound,
            ErrorCode::Fetch { status: Some(403) } => FailureCategory::Forbidden,
            ErrorCode::Fetch { status: Some(s) } if s >= 500 => FailureCategory::ServerError,
            _ => FailureCategory::from_message(&self.failure_text()),
        }
    }

    /// Code and source chain without the URL, whose path words must not steer categorization.
    fn failure_text(&self) -> String {
        let mut text = self.code.to_string();
        if let Some(ref src) = self.source {
            for cause in src.chain() {
                text.push_str(": ");
                text.push_str(&cause.to_string());
            }
        }
        text
    }
}

/// User-facing failure buckets shown on a "preview unavailable" card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureCategory {
    ContextInvalidated,
    Blocked,
    Timeout,
    Network,
    NotFound,
    Forbidden,
    ServerError,
    EmptyDocument,
    Generic,
}

impl FailureCategory {
    /// Classify free-form error text by the patterns browsers and fetch layers emit.
    pub fn from_message(message: &str) -> Self {
        let msg = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| msg.contains(n));

        if has(&["context invalidated", "extension context", "receiving end does not exist"]) {
            FailureCategory::ContextInvalidated
        } else if has(&["cors", "mixed content", "blocked", "cross-origin", "ssrf"]) {
            FailureCategory::Blocked
        } else if has(&["timeout", "timed out", "aborted"]) {
            FailureCategory::Timeout
        } else if has(&["404", "not found"]) {
            FailureCategory::NotFound
        } else if has(&["403", "forbidden"]) {
            FailureCategory::Forbidden
        } else if has(&["500", "internal server error", "502", "503", "bad gateway"]) {
            FailureCategory::ServerError
        } else if has(&["network", "failed to fetch", "dns", "connection", "unreachable"]) {
            FailureCategory::Network
        } else {
            FailureCategory::Generic
        }
    }

    /// Short explanation suitable for rendering in place of a preview.
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureCategory::ContextInvalidated => {
                "Preview unavailable. Reload the page to re-enable previews."
            }
            FailureCategory::Blocked => "This site doesn't allow its content to be previewed.",
            FailureCategory::Timeout => "The page took too long to respond.",
            FailureCategory::Network => "Couldn't reach the site. Check your connection.",
            FailureCategory::NotFound => "This page doesn't exist (404).",
            FailureCategory::Forbidden => "Access to this page is restricted (403).",
            FailureCategory::ServerError => "The site had a server error (500).",
            FailureCategory::EmptyDocument => "The page returned no content to preview.",
            FailureCategory::Generic => "Unable to load a preview for this link.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_status() {
        let err = PreviewError::fetch("https://example.com", "Fetch", Some(404), None);
        assert_eq!(err.category(), FailureCategory::NotFound);
        let err = PreviewError::fetch("https://example.com", "Fetch", Some(403), None);
        assert_eq!(err.category(), FailureCategory::Forbidden);
        let err = PreviewError::fetch("https://example.com", "Fetch", Some(503), None);
        assert_eq!(err.category(), FailureCategory::ServerError);
    }

    #[test]
    fn test_category_from_code() {
        let err = PreviewError::timeout("https://example.com", "Fetch", None);
        assert_eq!(err.category(), FailureCategory::Timeout);
        assert!(err.is_transient());
        let err = PreviewError::blocked("https://example.com", "Fetch", None);
        assert_eq!(err.category(), FailureCategory::Blocked);
        assert!(!err.is_transient());
        let err = PreviewError::network("https://example.com", "Fetch", None);
        assert!(err.is_network() && err.is_transient());
        let err = PreviewError::context_invalidated("https://example.com", "Preview", None);
        assert_eq!(err.category(), FailureCategory::ContextInvalidated);
    }

    #[test]
    fn test_category_falls_back_to_message() {
        let err = PreviewError::extract(
            "https://example.com",
            "Extract",
            Some(anyhow::anyhow!("Extension context invalidated.")),
        );
        assert_eq!(err.category(), FailureCategory::ContextInvalidated);
    }

    #[test]
    fn test_category_ignores_url_words() {
        for url in [
            "https://example.com/blocked-users",
            "https://example.com/timeout-guide",
            "https://network.example.com/forbidden",
        ] {
            let err = PreviewError::fetch(url, "Fetch", Some(410), None);
            assert_eq!(err.category(), FailureCategory::Generic, "{url}");
        }
    }

    #[test]
    fn test_from_message_patterns() {
        assert_eq!(
            FailureCategory::from_message("Request timed out after 5000ms"),
            FailureCategory::Timeout
        );
        assert_eq!(
            FailureCategory::from_message("Blocked by CORS policy"),
            FailureCategory::Blocked
        );
        assert_eq!(
            FailureCategory::from_message("HTTP 500 Internal Server Error"),
            FailureCategory::ServerError
        );
        assert_eq!(
            FailureCategory::from_message("TypeError: Failed to fetch"),
            FailureCategory::Network
        );
        assert_eq!(FailureCategory::from_message("???"), FailureCategory::Generic);
    }

    #[test]
    fn test_messages_are_distinct() {
        let all = [
            FailureCategory::ContextInvalidated,
            FailureCategory::Blocked,
            FailureCategory::Timeout,
            FailureCategory::Network,
            FailureCategory::NotFound,
            FailureCategory::Forbidden,
            FailureCategory::ServerError,
            FailureCategory::EmptyDocument,
            FailureCategory::Generic,
        ];
        let mut messages: Vec<_> = all.iter().map(|c| c.user_message()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), all.len());
    }

    #[test]
    fn test_display_includes_source() {
        let err = PreviewError::parse("https://example.com", "Parse", Some(anyhow::anyhow!("empty")));
        let s = err.to_string();
        assert!(s.contains("Parse"));
        assert!(s.contains("empty"));
    }
}
