//! Observer trait for load-controller events.
//!
//! Inject an [`Arc<dyn BenchmarkObserver>`] via
//! [`crate::bench::LoadController::with_observer`] to follow a run as it
//! happens: the bench CLI drives a terminal spinner from it, tests count
//! events with it.
//!
//! # Example
//!
//! ```rust
//! use web2md::bench::{BenchmarkObserver, TierReport};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct TierCounter(AtomicUsize);
//!
//! impl BenchmarkObserver for TierCounter {
//!     fn on_tier_complete(&self, report: &TierReport) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} req/s: {:?}", report.tier, report.mean_latency);
//!     }
//! }
//! ```

use super::controller::ControllerState;
use super::report::{StopReason, TierReport};
use std::sync::Arc;

/// Called by [`crate::bench::LoadController`] as a run progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait BenchmarkObserver: Send + Sync {
    /// Called on every state transition, including the initial
    /// `Idle → Running`.
    fn on_state_change(&self, state: ControllerState) {
        let _ = state;
    }

    /// Called before the first batch of a window.
    fn on_tier_start(&self, tier: u64) {
        let _ = tier;
    }

    /// Called for each sample that carries an error message.
    fn on_sample_error(&self, tier: u64, error: &str) {
        let _ = (tier, error);
    }

    /// Called once a window has finished, before the stop/escalate decision.
    fn on_tier_complete(&self, report: &TierReport) {
        let _ = report;
    }

    /// Called once, when the run ends.
    fn on_stop(&self, reason: &StopReason) {
        let _ = reason;
    }
}

/// The default observer: ignores everything.
pub struct NoopObserver;

impl BenchmarkObserver for NoopObserver {}

/// Convenience alias for the type held by the controller.
pub type SharedObserver = Arc<dyn BenchmarkObserver>;
