//! Request and result types exchanged with callers and over HTTP.

use serde::{Deserialize, Serialize};

/// Query of a single-URL conversion request (`GET /convert?url=...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub url: String,
}

/// Body of `POST /convert/batch`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub urls: Vec<String>,
}

/// Outcome of converting one URL inside a batch.
///
/// On success `markdown` is non-empty and `error` is `None`; on failure
/// `markdown` is empty and `error` holds a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub url: String,
    pub markdown: String,
    pub success: bool,
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn ok(url: impl Into<String>, markdown: String) -> Self {
        Self {
            url: url.into(),
            markdown,
            success: true,
            error: None,
        }
    }

    pub fn failed(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            markdown: String::new(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Body of the `POST /convert/batch` response. `results[i]` belongs to
/// `urls[i]` of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<ConversionResult>,
}

impl BatchResponse {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}
