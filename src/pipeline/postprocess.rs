//! Post-processing: deterministic cleanup of rendered Markdown.
//!
//! The renderer is faithful to its input, which for real-world pages means
//! it also faithfully reproduces their noise: conditional comments and
//! tracking snippets survive as raw `<!-- ... -->` text, and layout `<div>`s
//! with nothing in them turn into long runs of empty lines. Three cheap
//! string rules fix this without touching content.
//!
//! ## Rule Order
//!
//! Comments are removed first: stripping a comment that sat on its own line
//! leaves an empty line behind, and the blank-run collapse must see it.
//! Trimming runs last so the output never starts or ends with whitespace.
//!
//! The pipeline is idempotent: `clean_markdown(clean_markdown(x)) ==
//! clean_markdown(x)`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to rendered Markdown.
///
/// Rules (applied in order):
/// 1. Remove HTML comment spans, including multi-line ones
/// 2. Collapse 3+ consecutive blank lines down to 2
/// 3. Trim leading and trailing whitespace of the whole document
pub fn clean_markdown(input: &str) -> String {
    let s = remove_html_comments(input);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Remove HTML comments ─────────────────────────────────────────────

static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Removing one comment can splice the text around it into a new one
/// (`<<!-- x -->!-- y -->`), so repeat until nothing matches.
fn remove_html_comments(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = RE_COMMENT.replace_all(&current, "");
        if next.len() == current.len() {
            return current;
        }
        current = next.into_owned();
    }
}

// ── Rule 2: Collapse excessive blank lines ───────────────────────────────────

/// Four or more newlines separated only by whitespace, i.e. three or more
/// blank (or whitespace-only) lines.
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n\s*\n+").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────
