//! URL normalisation: make every link and asset reference absolute.
//!
//! Rendered Markdown is read far away from the page it came from, so a link
//! like `[About](/about)` is useless to the reader. Before rendering we
//! resolve the `href`/`src` attributes of `<a>`, `<img>`, `<link>` and
//! `<script>` against the page URL.
//!
//! The page is parsed with `scraper` (html5ever underneath) and written back
//! out from the tree. Only real elements are rewritten: look-alike markup
//! inside `<script>`, `<style>`, comments or `<textarea>` is text to the
//! parser and comes out as it went in. Serialisation normalises the document
//! shape (implied `<html>`/`<body>`, attribute quoting), not its content;
//! values that are not rewritten keep their exact text.

use scraper::node::{Doctype, Element};
use scraper::{ElementRef, Html, Node};
use tracing::debug;
use url::Url;

/// Prefixes of values that are already absolute or must not be resolved.
const ABSOLUTE_PREFIXES: [&str; 7] = [
    "http://", "https://", "mailto:", "tel:", "#", "data:", "//",
];

/// Elements whose `href`/`src` are rewritten.
const LINK_ELEMENTS: [&str; 4] = ["a", "img", "link", "script"];

/// Elements without content or end tag.
const VOID_ELEMENTS: [&str; 15] = [
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "link", "meta", "source", "track",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: [&str; 8] = [
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Whether `value` must be left untouched.
pub fn is_absolute(value: &str) -> bool {
    let v = value.trim_start();
    ABSOLUTE_PREFIXES.iter().any(|p| {
        v.len() >= p.len() && v.as_bytes()[..p.len()].eq_ignore_ascii_case(p.as_bytes())
    })
}

/// Rewrite relative `href`/`src` values in `html` to absolute URLs resolved
/// against `base_url`.
///
/// Never fails: the parser recovers from any malformed markup, and when
/// `base_url` is not an absolute URL the input is returned unchanged. A value
/// that cannot be joined keeps its original text.
pub fn absolutize_urls(html: &str, base_url: &str) -> String {
    let base = match Url::parse(base_url) {
        Ok(b) => b,
        Err(e) => {
            debug!("Skipping URL normalisation, bad base '{}': {}", base_url, e);
            return html.to_string();
        }
    };

    let document = Html::parse_document(html);
    let mut out = String::with_capacity(html.len() + html.len() / 8);
    for node in document.tree.root().children() {
        match node.value() {
            Node::Doctype(doctype) => write_doctype(doctype, &mut out),
            Node::Comment(comment) => write_comment(comment, &mut out),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(node) {
                    write_element(element, &base, &mut out);
                }
            }
            _ => {}
        }
    }
    out
}

fn write_element(element: ElementRef<'_>, base: &Url, out: &mut String) {
    let el = element.value();
    let name = el.name();

    out.push('<');
    out.push_str(name);
    write_attributes(el, base, out);
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    let raw = RAW_TEXT_ELEMENTS.contains(&name);
    for child in element.children() {
        match child.value() {
            Node::Text(text) if raw => out.push_str(text),
            Node::Text(text) => escape_text(text, out),
            Node::Comment(comment) => write_comment(comment, out),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(child, base, out);
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_attributes(el: &Element, base: &Url, out: &mut String) {
    let is_link_element = LINK_ELEMENTS.contains(&el.name());
    for (attr, value) in el.attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        let resolved = if is_link_element && (attr == "href" || attr == "src") {
            resolve(value, base)
        } else {
            None
        };
        escape_attr(resolved.as_deref().unwrap_or(value), out);
        out.push('"');
    }
}

/// Absolute form of `value`, or `None` when it stays as written.
fn resolve(value: &str, base: &Url) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_absolute(trimmed) {
        return None;
    }
    match base.join(trimmed) {
        Ok(url) => Some(url.into()),
        Err(e) => {
            debug!("Leaving '{}' as is: {}", value, e);
            None
        }
    }
}

fn write_doctype(doctype: &Doctype, out: &mut String) {
    out.push_str("<!DOCTYPE ");
    out.push_str(doctype.name());
    out.push('>');
}

fn write_comment(comment: &str, out: &mut String) {
    out.push_str("<!--");
    out.push_str(comment);
    out.push_str("-->");
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
