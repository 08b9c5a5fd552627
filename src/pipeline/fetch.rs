//! Page fetching: browser-like GET under the process-wide admission gate.
//!
//! ## Two-step fetch
//!
//! With [`FetchStrategy::Primed`] the page is requested twice. The first
//! response is only mined for `Set-Cookie` headers, which are replayed on
//! the second request; sites that gate first-time visitors behind a consent
//! or bot-check page then serve the real content. The priming request is
//! allowed to fail in any way: its error is logged at debug level and the
//! main request goes ahead without cookies. Only the main request decides
//! the outcome.
//!
//! The priming request gets half the configured timeout (see
//! [`priming_timeout`]), so one fetch holds its permit for at most
//! 1.5 × `request_timeout_secs` rather than twice that.
//!
//! ## Admission
//!
//! One [`crate::limiter::LimiterPermit`] is held from before the first
//! request until the main response body has been read, and released on
//! every exit path when the guard drops.

use crate::config::{ConversionConfig, FetchStrategy};
use crate::error::Web2MdError;
use crate::headers::browser_headers;
use crate::limiter::ConcurrencyLimiter;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use std::error::Error as _;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// HTTP fetcher shared by every conversion in the process.
pub struct Fetcher {
    client: reqwest::Client,
    user_agent: String,
    strategy: FetchStrategy,
    timeout_secs: u64,
    prime_timeout: Duration,
    limiter: Arc<ConcurrencyLimiter>,
}

/// Time budget of the priming request for a given main-request timeout.
pub fn priming_timeout(request_timeout: Duration) -> Duration {
    request_timeout / 2
}

impl Fetcher {
    /// Build the underlying HTTP client from `config`.
    pub fn new(
        config: &ConversionConfig,
        limiter: Arc<ConcurrencyLimiter>,
    ) -> Result<Self, Web2MdError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Web2MdError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            strategy: config.fetch_strategy,
            timeout_secs: config.request_timeout_secs,
            prime_timeout: priming_timeout(config.request_timeout()),
            limiter,
        })
    }

    pub fn limiter(&self) -> &Arc<ConcurrencyLimiter> {
        &self.limiter
    }

    /// Fetch `url` and return the response body as text.
    ///
    /// # Errors
    /// - [`Web2MdError::HttpStatus`] for a non-2xx main response
    /// - [`Web2MdError::FetchTimeout`] when the main request times out
    /// - [`Web2MdError::FetchFailed`] for transport or body-read failures
    pub async fn fetch(&self, url: &Url) -> Result<String, Web2MdError> {
        let _permit = self.limiter.acquire().await?;
        let start = Instant::now();

        let cookies = match self.strategy {
            FetchStrategy::Primed => self.prime(url).await,
            FetchStrategy::Direct => None,
        };

        let mut headers = browser_headers(&self.user_agent);
        if let Some(cookies) = cookies {
            headers.insert(COOKIE, cookies);
        }

        let response = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.map_err(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Web2MdError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_err(url, e))?;

        debug!(
            "Fetched {} ({} bytes) in {}ms",
            url,
            body.len(),
            start.elapsed().as_millis()
        );
        Ok(body)
    }

    /// Issue the priming request and return a `Cookie` header value built
    /// from its `Set-Cookie` headers. Every failure, including running past
    /// the priming timeout, yields `None`.
    async fn prime(&self, url: &Url) -> Option<HeaderValue> {
        let response = match self
            .client
            .get(url.clone())
            .headers(browser_headers(&self.user_agent))
            .timeout(self.prime_timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!("Priming request for {} failed, continuing: {}", url, e);
                return None;
            }
        };

        let cookies = cookie_header(response.headers());
        if let Some(ref c) = cookies {
            debug!("Priming {} picked up cookies: {:?}", url, c);
        }
        cookies
    }

    fn map_err(&self, url: &Url, e: reqwest::Error) -> Web2MdError {
        if e.is_timeout() {
            Web2MdError::FetchTimeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            Web2MdError::FetchFailed {
                url: url.to_string(),
                reason: error_chain(&e),
            }
        }
    }
}

/// Turn `Set-Cookie` response headers into a single `Cookie` request value,
/// keeping only the `name=value` pair of each cookie.
pub fn cookie_header(headers: &HeaderMap) -> Option<HeaderValue> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('=') && !pair.starts_with('='))
        .collect();

    if pairs.is_empty() {
        return None;
    }
    HeaderValue::from_str(&pairs.join("; ")).ok()
}

/// `reqwest` errors keep the useful detail (DNS failure, refused connection)
/// in their source chain.
fn error_chain(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}
