//! Pipeline stages for web-page-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! is independently testable and the renderer can be swapped without
//! touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ normalize ──▶ render ──▶ postprocess
//! (HTTP)    (abs. URLs)   (html2md)  (cleanup)
//! ```
//!
//! 1. [`fetch`]: browser-like GET, optionally primed for cookies; the
//!    only stage with network I/O
//! 2. [`normalize`]: rewrite relative `href`/`src` values to absolute URLs
//!    so links survive outside the original site
//! 3. [`render`]: HTML → Markdown behind the [`render::MarkdownRenderer`]
//!    trait; runs in `spawn_blocking` because it is CPU-bound
//! 4. [`postprocess`]: deterministic text cleanup (comments, blank runs)

pub mod fetch;
pub mod normalize;
pub mod postprocess;
pub mod render;
