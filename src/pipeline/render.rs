//! HTML → Markdown rendering.
//!
//! Rendering rules (link and image syntax, table layout, code fences) belong
//! to the renderer, not to this crate. The [`MarkdownRenderer`] trait is the
//! seam: the default [`Html2MdRenderer`] delegates to the `html2md` crate,
//! and tests or embedders can plug in their own.
//!
//! Rendering is CPU-bound and the third-party parser is not written with
//! async executors in mind, so [`render_blocking`] moves it onto tokio's
//! blocking pool. A panic inside the renderer is caught there and reported
//! as [`Web2MdError::RenderFailed`] instead of tearing down the worker.

use crate::error::Web2MdError;
use std::sync::Arc;
use tracing::debug;

/// Converts an HTML document into Markdown text.
///
/// Implementations must be `Send + Sync`: one renderer instance is shared by
/// every conversion in the process.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, html: &str) -> Result<String, Web2MdError>;
}

/// Renderer backed by [`html2md::parse_html`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Html2MdRenderer;

impl MarkdownRenderer for Html2MdRenderer {
    fn render(&self, html: &str) -> Result<String, Web2MdError> {
        Ok(html2md::parse_html(html))
    }
}

/// Render `html` on the blocking pool.
///
/// `url` is only used to label errors.
pub async fn render_blocking(
    renderer: &Arc<dyn MarkdownRenderer>,
    html: String,
    url: &str,
) -> Result<String, Web2MdError> {
    let renderer = Arc::clone(renderer);
    let html_len = html.len();

    let rendered = tokio::task::spawn_blocking(move || renderer.render(&html))
        .await
        .map_err(|e| Web2MdError::RenderFailed {
            url: url.to_string(),
            detail: if e.is_panic() {
                "renderer panicked".to_string()
            } else {
                e.to_string()
            },
        })?;

    let markdown = rendered.map_err(|e| match e {
        Web2MdError::RenderFailed { .. } => e,
        other => Web2MdError::RenderFailed {
            url: url.to_string(),
            detail: other.to_string(),
        },
    })?;

    debug!(
        "Rendered {}: {} bytes HTML → {} bytes Markdown",
        url,
        html_len,
        markdown.len()
    );
    Ok(markdown)
}
