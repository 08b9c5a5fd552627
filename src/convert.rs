//! Single-URL conversion: URL → fetched HTML → Markdown.
//!
//! [`PageConverter`] owns the long-lived pieces of the pipeline (HTTP client,
//! renderer, a handle on the shared admission gate) so the HTTP service and
//! the batch orchestrator can reuse one instance for every request. The free
//! function [`convert_url`] is the one-shot convenience for library callers.

use crate::config::ConversionConfig;
use crate::error::Web2MdError;
use crate::limiter::ConcurrencyLimiter;
use crate::pipeline::fetch::Fetcher;
use crate::pipeline::render::{self, MarkdownRenderer};
use crate::pipeline::{normalize, postprocess};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

/// Anything that can turn a URL into Markdown.
///
/// The batch orchestrator is written against this trait so that its
/// ordering and failure-isolation guarantees can be exercised without a
/// network.
pub trait UrlConverter: Send + Sync {
    fn convert(&self, url: &str) -> impl Future<Output = Result<String, Web2MdError>> + Send;

    /// How many conversions may usefully run at once.
    fn concurrency(&self) -> usize;
}

/// Fetch-and-convert pipeline bound to one admission gate.
pub struct PageConverter {
    fetcher: Fetcher,
    renderer: Arc<dyn MarkdownRenderer>,
}

impl PageConverter {
    /// Build a converter that admits fetches through `limiter`.
    pub fn new(
        config: &ConversionConfig,
        limiter: Arc<ConcurrencyLimiter>,
    ) -> Result<Self, Web2MdError> {
        Ok(Self {
            fetcher: Fetcher::new(config, limiter)?,
            renderer: Arc::clone(&config.renderer),
        })
    }

    /// Build a converter with its own gate sized by `config.max_concurrency`.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Web2MdError> {
        let limiter = Arc::new(ConcurrencyLimiter::new(config.max_concurrency));
        Self::new(config, limiter)
    }

    pub fn limiter(&self) -> &Arc<ConcurrencyLimiter> {
        self.fetcher.limiter()
    }

    /// Convert the page at `url` to Markdown.
    ///
    /// # Errors
    /// - [`Web2MdError::InvalidUrl`] before any network activity
    /// - a fetch error (`HttpStatus`, `FetchTimeout`, `FetchFailed`)
    /// - [`Web2MdError::RenderFailed`] or [`Web2MdError::EmptyDocument`]
    pub async fn convert(&self, url: &str) -> Result<String, Web2MdError> {
        let start = Instant::now();
        let parsed = validate_url(url)?;
        info!("Converting {}", parsed);

        let html = self.fetcher.fetch(&parsed).await?;
        let markdown = self.convert_html(html, parsed.as_str()).await?;

        info!(
            "Converted {} → {} bytes in {}ms",
            parsed,
            markdown.len(),
            start.elapsed().as_millis()
        );
        Ok(markdown)
    }

    /// Run the offline half of the pipeline on HTML the caller already has:
    /// normalise links against `base_url`, render, post-process.
    pub async fn convert_html(&self, html: String, base_url: &str) -> Result<String, Web2MdError> {
        let normalized = normalize::absolutize_urls(&html, base_url);
        let rendered = render::render_blocking(&self.renderer, normalized, base_url).await?;
        let markdown = postprocess::clean_markdown(&rendered);

        if markdown.is_empty() {
            return Err(Web2MdError::EmptyDocument {
                url: base_url.to_string(),
            });
        }
        debug!("Post-processed {}: {} bytes", base_url, markdown.len());
        Ok(markdown)
    }
}

impl UrlConverter for PageConverter {
    fn convert(&self, url: &str) -> impl Future<Output = Result<String, Web2MdError>> + Send {
        PageConverter::convert(self, url)
    }

    fn concurrency(&self) -> usize {
        self.limiter().capacity()
    }
}

/// Convert a single URL with a throwaway converter.
///
/// Prefer a long-lived [`PageConverter`] when converting many pages: it
/// reuses connections and shares one admission gate.
pub async fn convert_url(url: &str, config: &ConversionConfig) -> Result<String, Web2MdError> {
    PageConverter::from_config(config)?.convert(url).await
}

/// Parse `input` as an absolute HTTP(S) URL with a host.
pub fn validate_url(input: &str) -> Result<Url, Web2MdError> {
    let invalid = |reason: String| Web2MdError::InvalidUrl {
        url: input.to_string(),
        reason,
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("URL is empty".into()));
    }

    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "unsupported scheme '{}', expected http or https",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".into()));
    }
    Ok(url)
}
