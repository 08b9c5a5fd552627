//! Adaptive load controller.
//!
//! Drives a [`BatchEndpoint`] at increasing request rates until the mean
//! per-URL latency of a measurement window exceeds the configured threshold.
//!
//! ```text
//! Idle ─▶ Running(10) ─▶ Escalating ─▶ Running(100) ─▶ Escalating ─▶ Running(1100) ─▶ … ─▶ Stopped
//! ```
//!
//! Within a window the controller issues batches of `min(tier, urls)` URLs,
//! cycling through the list, and sleeps after each batch for whatever is
//! left of `batch_size / tier` seconds. Without a `max_tier` cap the loop
//! only ends when the threshold is crossed.

use super::client::BatchEndpoint;
use super::observer::{NoopObserver, SharedObserver};
use super::report::{BenchmarkReport, BenchmarkSample, StopReason, TierReport};
use crate::config::BenchmarkConfig;
use crate::error::Web2MdError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Where the controller is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    /// Measuring at the given requests-per-second tier.
    Running(u64),
    /// Between windows, choosing the next tier.
    Escalating,
    Stopped,
}

/// Tier that follows `tier`: everything below the floor jumps to it, the
/// rest climbs by the step.
pub fn next_tier(tier: u64, config: &BenchmarkConfig) -> u64 {
    if tier < config.escalation_floor {
        config.escalation_floor
    } else {
        tier.saturating_add(config.escalation_step)
    }
}

/// Finds the highest sustainable request rate of a batch endpoint.
pub struct LoadController<E> {
    endpoint: E,
    urls: Vec<String>,
    config: BenchmarkConfig,
    observer: SharedObserver,
    state: ControllerState,
}

impl<E: BatchEndpoint> LoadController<E> {
    /// `urls` is the pool batches are drawn from; it must not be empty.
    pub fn new(endpoint: E, urls: Vec<String>, config: BenchmarkConfig) -> Result<Self, Web2MdError> {
        if urls.is_empty() {
            return Err(Web2MdError::InvalidConfig(
                "Load controller needs at least one URL".into(),
            ));
        }
        Ok(Self {
            endpoint,
            urls,
            config,
            observer: Arc::new(NoopObserver),
            state: ControllerState::Idle,
        })
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Run tiers until one exceeds the latency threshold or the next tier
    /// would pass `max_tier`.
    pub async fn run(&mut self) -> BenchmarkReport {
        let mut tier = self.config.initial_tier.max(1);
        let mut tiers = Vec::new();

        loop {
            self.set_state(ControllerState::Running(tier));
            self.observer.on_tier_start(tier);
            info!("Testing at {} requests/second", tier);

            let report = self.run_window(tier).await;
            info!(
                "Tier {}: mean {:.2}ms, {}/{} valid over {} batches",
                tier,
                report.mean_latency.as_secs_f64() * 1000.0,
                report.valid,
                report.total,
                report.batches
            );
            self.observer.on_tier_complete(&report);

            let mean = report.mean_latency;
            tiers.push(report);

            if mean > self.config.latency_threshold {
                return self.finish(tiers, StopReason::ThresholdExceeded { tier, mean });
            }

            let next = next_tier(tier, &self.config);
            if self.config.max_tier.is_some_and(|cap| next > cap) {
                return self.finish(tiers, StopReason::MaxTierReached { tier });
            }

            self.set_state(ControllerState::Escalating);
            tier = next;
        }
    }

    /// One fixed-length measurement window at `tier`.
    async fn run_window(&self, tier: u64) -> TierReport {
        let batch_size = usize::try_from(tier)
            .unwrap_or(usize::MAX)
            .min(self.urls.len());
        let pace = Duration::from_secs_f64(batch_size as f64 / tier as f64);

        let window_start = Instant::now();
        let mut cursor = 0usize;
        let mut batches = 0usize;
        let mut samples = Vec::new();

        while window_start.elapsed() < self.config.window {
            let batch: Vec<String> = (cursor..cursor + batch_size)
                .map(|i| self.urls[i % self.urls.len()].clone())
                .collect();
            cursor += batch_size;

            let batch_start = Instant::now();
            let outcome = self.endpoint.convert_batch(&batch).await;
            let elapsed = batch_start.elapsed();
            batches += 1;

            let share = elapsed.div_f64(batch.len() as f64);
            match outcome {
                Ok(results) if results.len() == batch.len() => {
                    samples.extend(
                        results
                            .iter()
                            .map(|r| BenchmarkSample::from_result(r, share)),
                    );
                }
                Ok(results) => {
                    let reason = format!(
                        "batch of {} URLs returned {} results",
                        batch.len(),
                        results.len()
                    );
                    warn!("{}", reason);
                    samples.extend(batch.iter().map(|_| BenchmarkSample::failed(share, &reason)));
                }
                Err(e) => {
                    warn!("Batch call failed: {}", e);
                    let reason = e.to_string();
                    samples.extend(batch.iter().map(|_| BenchmarkSample::failed(share, &reason)));
                }
            }

            let start = samples.len() - batch.len();
            for sample in &samples[start..] {
                if !sample.error.is_empty() {
                    self.observer.on_sample_error(tier, &sample.error);
                }
            }

            tokio::time::sleep(pace.saturating_sub(elapsed)).await;
        }

        TierReport::from_samples(tier, samples, batches)
    }

    fn set_state(&mut self, state: ControllerState) {
        self.state = state;
        self.observer.on_state_change(state);
    }

    fn finish(&mut self, tiers: Vec<TierReport>, stop: StopReason) -> BenchmarkReport {
        info!("Benchmark stopped: {}", stop);
        self.set_state(ControllerState::Stopped);
        self.observer.on_stop(&stop);
        BenchmarkReport { tiers, stop }
    }
}
