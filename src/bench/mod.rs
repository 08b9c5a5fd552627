//! Load testing for a running web2md service.
//!
//! ```text
//! benchmark/urls.dat ─▶ load_urls ─▶ LoadController ──POST /convert/batch──▶ service
//!                                         │
//!                                         └─▶ BenchmarkObserver (spinner, logs)
//! ```

pub mod client;
pub mod controller;
pub mod observer;
pub mod report;

pub use client::{BatchEndpoint, HttpBatchEndpoint};
pub use controller::{next_tier, ControllerState, LoadController};
pub use observer::{BenchmarkObserver, NoopObserver, SharedObserver};
pub use report::{is_valid_markdown, BenchmarkReport, BenchmarkSample, StopReason, TierReport};

use crate::error::Web2MdError;
use std::path::Path;

/// Default location of the URL list, relative to the working directory.
pub const DEFAULT_URL_FILE: &str = "benchmark/urls.dat";

/// Read a newline-delimited URL list. Lines are trimmed; blank lines are
/// skipped.
///
/// # Errors
/// - [`Web2MdError::UrlFileNotFound`] if `path` does not exist
/// - [`Web2MdError::NoUrls`] if it holds no non-blank line
pub fn load_urls(path: impl AsRef<Path>) -> Result<Vec<String>, Web2MdError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Web2MdError::UrlFileNotFound {
            path: path.to_path_buf(),
        },
        _ => Web2MdError::Internal(format!("Failed to read '{}': {e}", path.display())),
    })?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if urls.is_empty() {
        return Err(Web2MdError::NoUrls {
            path: path.to_path_buf(),
        });
    }
    Ok(urls)
}
