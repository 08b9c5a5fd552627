//! # web2md
//!
//! Fetch web pages and convert them to clean Markdown, singly or in
//! batches, behind a small HTTP service, plus a load-test harness that
//! finds the request rate the service can sustain.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Validate   absolute http(s) URL with a host, else InvalidUrl
//!  ├─ 2. Fetch      browser-like GET (optional cookie priming) under the
//!  │                process-wide ConcurrencyLimiter
//!  ├─ 3. Normalize  relative href/src → absolute against the page URL
//!  ├─ 4. Render     HTML → Markdown (html2md, spawn_blocking)
//!  └─ 5. Polish     strip HTML comments, collapse blank-line runs, trim
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use web2md::{convert_url, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let markdown = convert_url("https://www.rust-lang.org/", &config).await?;
//!     println!("{markdown}");
//!     Ok(())
//! }
//! ```
//!
//! For many pages build one [`PageConverter`] and share it: every
//! conversion then reuses the same HTTP client and the same admission gate.
//! [`convert_batch`] converts a list of URLs with per-URL outcomes.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `web2md` and `web2md-bench` binaries (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! web2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod bench;
pub mod config;
pub mod convert;
pub mod error;
pub mod headers;
pub mod limiter;
pub mod output;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::convert_batch;
pub use config::{
    BenchmarkConfig, BenchmarkConfigBuilder, ConversionConfig, ConversionConfigBuilder,
    FetchStrategy, ServerConfig,
};
pub use convert::{convert_url, validate_url, PageConverter, UrlConverter};
pub use error::{ErrorKind, Web2MdError};
pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use output::{BatchRequest, BatchResponse, ConversionRequest, ConversionResult};
pub use pipeline::render::{Html2MdRenderer, MarkdownRenderer};
