//! Browser-like request headers.
//!
//! Plenty of sites serve a stripped or blocked page to clients that do not
//! look like a browser. Every fetch therefore carries a real browser
//! User-Agent plus the `Accept*` headers a browser would send. The
//! `Accept-Language` value is reshuffled per request so consecutive requests
//! do not share an identical header fingerprint.

use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

/// Known browser User-Agent strings, keyed by a short name.
pub const USER_AGENTS: &[(&str, &str)] = &[
    (
        "chrome_windows",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    ),
    (
        "firefox_windows",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
    ),
    (
        "safari_mac",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_3_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    ),
    (
        "edge_windows",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/122.0.0.0",
    ),
    (
        "mobile_chrome",
        "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Mobile Safari/537.36",
    ),
];

/// Default User-Agent: desktop Chrome on Windows.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

const LANGUAGES: [&str; 3] = ["en-US,en;q=0.9", "en-GB,en;q=0.8", "en;q=0.7"];

/// Look up a User-Agent string by its short name (e.g. `"firefox_windows"`).
pub fn user_agent(name: &str) -> Option<&'static str> {
    USER_AGENTS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, ua)| *ua)
}

/// Resolve a User-Agent setting: a table key such as `"safari_mac"` maps to
/// its full string, anything else is taken as a literal User-Agent.
pub fn resolve_user_agent(value: &str) -> &str {
    user_agent(value.trim()).unwrap_or(value)
}

/// A random permutation of the supported `Accept-Language` entries.
pub fn accept_language() -> String {
    let mut languages = LANGUAGES;
    languages.shuffle(&mut rand::thread_rng());
    languages.join(",")
}

/// Full browser header set for one request.
///
/// An unrepresentable `user_agent` (control characters) falls back to
/// [`DEFAULT_USER_AGENT`].
pub fn browser_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let ua = HeaderValue::from_str(user_agent)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(USER_AGENT, ua);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    if let Ok(lang) = HeaderValue::from_str(&accept_language()) {
        headers.insert(ACCEPT_LANGUAGE, lang);
    }
    headers
}
