//! Configuration types for the converter, the HTTP service and the load test.
//!
//! Conversion behaviour is controlled through [`ConversionConfig`], built via
//! its [`ConversionConfigBuilder`]. The load-test harness has its own
//! [`BenchmarkConfig`] because it drives a service over HTTP and shares no
//! knobs with the converter it measures.
//!
//! # Design choice: builder over constructor
//! Callers set only what they care about and rely on the documented
//! defaults for the rest; `build()` is the single place constraints are
//! validated.

use crate::error::Web2MdError;
use crate::headers::{resolve_user_agent, DEFAULT_USER_AGENT};
use crate::pipeline::render::{Html2MdRenderer, MarkdownRenderer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default process-wide cap on in-flight fetches.
pub const DEFAULT_MAX_CONCURRENCY: usize = 100;

/// Default per-request fetch timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default listening port of the HTTP service.
pub const DEFAULT_PORT: u16 = 8000;

/// Configuration for fetching and converting pages.
///
/// # Example
/// ```rust
/// use web2md::{ConversionConfig, FetchStrategy};
///
/// let config = ConversionConfig::builder()
///     .max_concurrency(20)
///     .request_timeout_secs(5)
///     .fetch_strategy(FetchStrategy::Direct)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_concurrency, 20);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Maximum number of fetches in flight across the whole process. Default: 100.
    ///
    /// Each fetch holds one slot from acquisition until its response body has
    /// been read. Batch fan-out is bounded by the same number.
    pub max_concurrency: usize,

    /// Per-request timeout in seconds, covering connect through body read. Default: 10.
    pub request_timeout_secs: u64,

    /// User-Agent sent with every request. Default: desktop Chrome on Windows.
    pub user_agent: String,

    /// Whether to issue a cookie-priming request before the main fetch. Default: [`FetchStrategy::Primed`].
    pub fetch_strategy: FetchStrategy,

    /// HTML → Markdown renderer. Default: [`Html2MdRenderer`].
    pub renderer: Arc<dyn MarkdownRenderer>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_strategy: FetchStrategy::default(),
            renderer: Arc::new(Html2MdRenderer),
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("max_concurrency", &self.max_concurrency)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("fetch_strategy", &self.fetch_strategy)
            .field("renderer", &"<dyn MarkdownRenderer>")
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.config.max_concurrency = n.max(1);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    /// Literal User-Agent, or a key of [`crate::headers::USER_AGENTS`].
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        let ua = ua.into();
        self.config.user_agent = resolve_user_agent(&ua).to_string();
        self
    }

    pub fn fetch_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.config.fetch_strategy = strategy;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        self.config.renderer = renderer;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Web2MdError> {
        let c = &self.config;
        if c.max_concurrency == 0 {
            return Err(Web2MdError::InvalidConfig(
                "Max concurrency must be ≥ 1".into(),
            ));
        }
        if c.user_agent.trim().is_empty() {
            return Err(Web2MdError::InvalidConfig(
                "User-Agent must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// How a page is fetched.
///
/// Many sites answer a cookieless first visit with a consent wall or a
/// bot-check page. Priming picks up the session cookies on a throwaway
/// request so the main request looks like a returning browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FetchStrategy {
    /// Single GET.
    Direct,
    /// Priming GET whose cookies are replayed on the main GET. Priming
    /// failures are ignored. (default)
    #[default]
    Primed,
}

// ── Service ──────────────────────────────────────────────────────────────

/// Listening address of the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Load test ────────────────────────────────────────────────────────────

/// Configuration for the adaptive load controller.
///
/// The defaults reproduce the historical benchmark: start at 10 req/s, run
/// 10-second windows, jump to 100 req/s, then climb by 1000 req/s per round
/// until mean latency exceeds 500 ms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// First target rate in requests per second. Default: 10.
    pub initial_tier: u64,

    /// Length of the measurement window per tier. Default: 10 s.
    pub window: Duration,

    /// Mean per-URL latency above which the run stops. Default: 500 ms.
    pub latency_threshold: Duration,

    /// Tiers below this jump straight to it. Default: 100.
    pub escalation_floor: u64,

    /// Increment applied to tiers at or above the floor. Default: 1000.
    pub escalation_step: u64,

    /// Optional safety cap; the run stops instead of escalating past it.
    /// Default: none (escalate until the latency threshold is crossed).
    pub max_tier: Option<u64>,

    /// Timeout for one batch call against the service under test. Default: 300 s.
    pub request_timeout_secs: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            initial_tier: 10,
            window: Duration::from_secs(10),
            latency_threshold: Duration::from_millis(500),
            escalation_floor: 100,
            escalation_step: 1000,
            max_tier: None,
            request_timeout_secs: 300,
        }
    }
}

impl BenchmarkConfig {
    /// Create a new builder for `BenchmarkConfig`.
    pub fn builder() -> BenchmarkConfigBuilder {
        BenchmarkConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BenchmarkConfig`].
#[derive(Debug)]
pub struct BenchmarkConfigBuilder {
    config: BenchmarkConfig,
}

impl BenchmarkConfigBuilder {
    pub fn initial_tier(mut self, tier: u64) -> Self {
        self.config.initial_tier = tier.max(1);
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    pub fn latency_threshold(mut self, threshold: Duration) -> Self {
        self.config.latency_threshold = threshold;
        self
    }

    pub fn escalation_floor(mut self, floor: u64) -> Self {
        self.config.escalation_floor = floor;
        self
    }

    pub fn escalation_step(mut self, step: u64) -> Self {
        self.config.escalation_step = step.max(1);
        self
    }

    pub fn max_tier(mut self, cap: Option<u64>) -> Self {
        self.config.max_tier = cap;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BenchmarkConfig, Web2MdError> {
        let c = &self.config;
        if c.window.is_zero() {
            return Err(Web2MdError::InvalidConfig(
                "Measurement window must be longer than zero".into(),
            ));
        }
        if let Some(cap) = c.max_tier {
            if cap < c.initial_tier {
                return Err(Web2MdError::InvalidConfig(format!(
                    "Max tier {} is below the initial tier {}",
                    cap, c.initial_tier
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.max_concurrency, 100);
        assert_eq!(c.request_timeout(), Duration::from_secs(10));
        assert_eq!(c.fetch_strategy, FetchStrategy::Primed);
        assert!(c.user_agent.contains("Mozilla/5.0"));
    }

    #[test]
    fn builder_clamps_zero_concurrency() {
        let c = ConversionConfig::builder().max_concurrency(0).build().unwrap();
        assert_eq!(c.max_concurrency, 1);
    }

    #[test]
    fn builder_rejects_blank_user_agent() {
        let err = ConversionConfig::builder().user_agent("  ").build();
        assert!(matches!(err, Err(Web2MdError::InvalidConfig(_))));
    }

    #[test]
    fn builder_expands_user_agent_keys() {
        let c = ConversionConfig::builder()
            .user_agent("safari_mac")
            .build()
            .unwrap();
        assert!(c.user_agent.contains("Version/17.2 Safari"), "got {}", c.user_agent);

        let c = ConversionConfig::builder()
            .user_agent("web2md-test/1.0")
            .build()
            .unwrap();
        assert_eq!(c.user_agent, "web2md-test/1.0");
    }

    #[test]
    fn server_bind_addr() {
        assert_eq!(ServerConfig::default().bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn benchmark_defaults() {
        let c = BenchmarkConfig::default();
        assert_eq!(c.initial_tier, 10);
        assert_eq!(c.window, Duration::from_secs(10));
        assert_eq!(c.latency_threshold, Duration::from_millis(500));
        assert_eq!(c.escalation_floor, 100);
        assert_eq!(c.escalation_step, 1000);
        assert_eq!(c.max_tier, None);
    }

    #[test]
    fn benchmark_rejects_cap_below_start() {
        let err = BenchmarkConfig::builder()
            .initial_tier(50)
            .max_tier(Some(20))
            .build();
        assert!(matches!(err, Err(Web2MdError::InvalidConfig(_))));
    }

    #[test]
    fn benchmark_rejects_zero_window() {
        let err = BenchmarkConfig::builder().window(Duration::ZERO).build();
        assert!(err.is_err());
    }
}
