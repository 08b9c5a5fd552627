//! Error types for the web2md library.
//!
//! Two distinct failure scopes exist:
//!
//! * [`Web2MdError`] returned from [`crate::convert::PageConverter::convert`]
//!   means the single URL could not be converted. The HTTP service maps it
//!   to a `400` or `500` depending on [`Web2MdError::is_client_error`].
//!
//! * Inside a batch the same error is never propagated. It is rendered to a
//!   string and stored in [`crate::output::ConversionResult::error`] so one
//!   bad URL cannot cost the caller the rest of the batch.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the web2md library.
#[derive(Debug, Error)]
pub enum Web2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input is not a well-formed absolute HTTP/HTTPS URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The server answered with a non-2xx status.
    #[error("Error fetching URL '{url}': HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The request exceeded the configured timeout.
    #[error("Error fetching URL '{url}': timed out after {secs}s")]
    FetchTimeout { url: String, secs: u64 },

    /// Connection, TLS, redirect or body-read failure.
    #[error("Error fetching URL '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The HTML could not be rendered to Markdown.
    #[error("Failed to render '{url}' to Markdown: {detail}")]
    RenderFailed { url: String, detail: String },

    /// The page was fetched and rendered but produced no Markdown at all.
    #[error("Page '{url}' has no convertible content")]
    EmptyDocument { url: String },

    // ── Benchmark input errors ────────────────────────────────────────────
    /// The URL list for the load test does not exist.
    #[error("URL list not found: '{path}'\nCreate it with one URL per line.")]
    UrlFileNotFound { path: PathBuf },

    /// The URL list exists but contains no URLs.
    #[error("No URLs found in '{path}'")]
    NoUrls { path: PathBuf },

    /// A batch call against the service under test failed.
    #[error("Batch request failed: {reason}")]
    BenchmarkRequest { reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used for status-code mapping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidUrl,
    Fetch,
    Render,
    Internal,
}

impl Web2MdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Web2MdError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Web2MdError::HttpStatus { .. }
            | Web2MdError::FetchTimeout { .. }
            | Web2MdError::FetchFailed { .. } => ErrorKind::Fetch,
            Web2MdError::RenderFailed { .. } | Web2MdError::EmptyDocument { .. } => {
                ErrorKind::Render
            }
            _ => ErrorKind::Internal,
        }
    }

    /// Whether the failure is attributable to the caller's input or to the
    /// remote page rather than to this service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Web2MdError::InvalidUrl { .. }
                | Web2MdError::HttpStatus { .. }
                | Web2MdError::FetchTimeout { .. }
                | Web2MdError::FetchFailed { .. }
                | Web2MdError::EmptyDocument { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_display() {
        let e = Web2MdError::InvalidUrl {
            url: "not-a-url".into(),
            reason: "relative URL without a base".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("not-a-url"), "got: {msg}");
        assert!(e.is_client_error());
        assert_eq!(e.kind(), ErrorKind::InvalidUrl);
    }

    #[test]
    fn http_status_display() {
        let e = Web2MdError::HttpStatus {
            url: "https://site.example/missing".into(),
            status: 404,
        };
        assert!(e.to_string().contains("HTTP 404"));
        assert_eq!(e.kind(), ErrorKind::Fetch);
        assert!(e.is_client_error());
    }

    #[test]
    fn timeout_display() {
        let e = Web2MdError::FetchTimeout {
            url: "https://slow.example".into(),
            secs: 10,
        };
        assert!(e.to_string().contains("10s"));
        assert!(e.is_client_error());
    }

    #[test]
    fn render_failure_is_server_side() {
        let e = Web2MdError::RenderFailed {
            url: "https://site.example".into(),
            detail: "renderer panicked".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Render);
        assert!(!e.is_client_error());
    }

    #[test]
    fn empty_document_is_client_side() {
        let e = Web2MdError::EmptyDocument {
            url: "https://blank.example".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Render);
        assert!(e.is_client_error());
    }

    #[test]
    fn internal_is_server_side() {
        let e = Web2MdError::Internal("limiter closed".into());
        assert_eq!(e.kind(), ErrorKind::Internal);
        assert!(!e.is_client_error());
    }

    #[test]
    fn benchmark_request_is_not_a_page_fetch() {
        let e = Web2MdError::BenchmarkRequest {
            reason: "connection refused".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Internal);
        assert!(!e.is_client_error());
    }
}
