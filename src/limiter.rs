//! Process-wide admission gate for outbound fetches.
//!
//! [`ConcurrencyLimiter`] is a counting semaphore with a fixed capacity. It
//! is constructed once at startup, shared by `Arc`, and handed to every
//! component that fetches, so its capacity is an explicit part of the
//! service configuration rather than hidden global state.
//!
//! ## Reconfiguration
//!
//! [`ConcurrencyLimiter::reconfigure`] swaps in a fresh pool. Acquisitions
//! started afterwards draw from the new pool; permits already handed out
//! belong to the old pool and return to it when dropped. While old holders
//! drain, the number of in-flight fetches can therefore briefly exceed the
//! new capacity.

use crate::error::Web2MdError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::info;

/// Bounded admission gate. See the module docs.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    pool: Mutex<Arc<Semaphore>>,
    capacity: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
}

/// One admitted slot. The slot is returned when this guard is dropped.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for LimiterPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyLimiter {
    /// Create a gate admitting at most `capacity` holders (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pool: Mutex::new(Arc::new(Semaphore::new(capacity))),
            capacity: AtomicUsize::new(capacity),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot.
    ///
    /// The pool lock is held only long enough to clone the current
    /// semaphore, never across the await.
    pub async fn acquire(&self) -> Result<LimiterPermit, Web2MdError> {
        let pool = self.current_pool();
        let permit = pool
            .acquire_owned()
            .await
            .map_err(|_| Web2MdError::Internal("concurrency limiter closed".into()))?;
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Ok(LimiterPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Replace the pool with one of `capacity` slots (minimum 1). Only
    /// acquisitions started after this call are affected.
    pub fn reconfigure(&self, capacity: usize) {
        let capacity = capacity.max(1);
        let mut pool = self.pool.lock().unwrap_or_else(|e| e.into_inner());
        *pool = Arc::new(Semaphore::new(capacity));
        let previous = self.capacity.swap(capacity, Ordering::SeqCst);
        info!("Concurrency limit changed: {} → {}", previous, capacity);
    }

    /// Capacity of the current pool.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::SeqCst)
    }

    /// Free slots in the current pool.
    pub fn available(&self) -> usize {
        self.current_pool().available_permits()
    }

    /// Permits currently held, across the current and any drained pools.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn current_pool(&self) -> Arc<Semaphore> {
        let pool = self.pool.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&pool)
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_CONCURRENCY)
    }
}
