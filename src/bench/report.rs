//! Samples and reports produced by the load controller.

use crate::output::ConversionResult;
use std::fmt;
use std::time::Duration;

/// Characters whose presence marks a body as Markdown rather than an error
/// page or an empty string.
const MARKDOWN_INDICATORS: &[char] = &['#', '-', '*', '`', '[', ']', '(', ')', '_'];

/// Cheap plausibility check: does `text` contain any Markdown syntax at all?
pub fn is_valid_markdown(text: &str) -> bool {
    text.contains(MARKDOWN_INDICATORS)
}

/// One URL's share of a batch call.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSample {
    /// The batch's wall-clock time divided evenly across its members.
    pub duration: Duration,
    pub valid: bool,
    /// Empty when the member reported no error.
    pub error: String,
}

impl BenchmarkSample {
    pub fn from_result(result: &ConversionResult, duration: Duration) -> Self {
        Self {
            duration,
            valid: result.success && is_valid_markdown(&result.markdown),
            error: result.error.clone().unwrap_or_default(),
        }
    }

    /// Stand-in for a member of a batch call that failed as a whole.
    pub fn failed(duration: Duration, error: impl Into<String>) -> Self {
        Self {
            duration,
            valid: false,
            error: error.into(),
        }
    }
}

/// Result of one fixed-duration window at a single rate tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierReport {
    /// Target requests per second.
    pub tier: u64,
    pub samples: Vec<BenchmarkSample>,
    pub mean_latency: Duration,
    pub valid: usize,
    pub total: usize,
    /// Batch calls issued during the window.
    pub batches: usize,
}

impl TierReport {
    pub fn from_samples(tier: u64, samples: Vec<BenchmarkSample>, batches: usize) -> Self {
        let total = samples.len();
        let valid = samples.iter().filter(|s| s.valid).count();
        let mean_latency = if total == 0 {
            Duration::ZERO
        } else {
            samples
                .iter()
                .map(|s| s.duration)
                .sum::<Duration>()
                .div_f64(total as f64)
        };
        Self {
            tier,
            samples,
            mean_latency,
            valid,
            total,
            batches,
        }
    }

    /// Share of valid samples in percent; 0 for an empty window.
    pub fn valid_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 * 100.0 / self.total as f64
        }
    }

    /// Error messages of the samples that carried one.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.samples
            .iter()
            .map(|s| s.error.as_str())
            .filter(|e| !e.is_empty())
    }
}

/// Why the controller stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The window at `tier` averaged `mean`, above the latency threshold.
    ThresholdExceeded { tier: u64, mean: Duration },
    /// The next tier would exceed the configured cap; `tier` was the last
    /// one run, and it stayed under the threshold.
    MaxTierReached { tier: u64 },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ThresholdExceeded { tier, mean } => write!(
                f,
                "average response time {:.2}ms exceeded the threshold at {} requests/second",
                mean.as_secs_f64() * 1000.0,
                tier
            ),
            StopReason::MaxTierReached { tier } => {
                write!(f, "maximum tier reached at {} requests/second", tier)
            }
        }
    }
}

/// Everything a finished run observed.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    /// One entry per tier, in the order they ran.
    pub tiers: Vec<TierReport>,
    pub stop: StopReason,
}

impl BenchmarkReport {
    /// Highest tier that stayed under the threshold, if any did.
    pub fn last_sustainable_tier(&self) -> Option<u64> {
        match self.stop {
            StopReason::ThresholdExceeded { .. } => self.tiers.iter().rev().nth(1).map(|t| t.tier),
            StopReason::MaxTierReached { .. } => self.tiers.last().map(|t| t.tier),
        }
    }
}
