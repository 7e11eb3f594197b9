//! Lock runtime configuration

use std::{future::Future, time::Duration};

/// Interval used for both acquisition polling and inbox servicing.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Sleep function trait for testing with different timing backends.
pub trait Sleep: Clone + Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Tokio-based sleep implementation
#[derive(Clone, Copy, Default)]
pub struct TokioSleep;

impl Sleep for TokioSleep {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Configuration for a [`LamportLock`](crate::LamportLock).
///
/// The lock is a busy-poll design: acquisition re-checks the lock predicate
/// and the servicing loop re-checks the inbox at a fixed interval. Latency
/// is bounded by the interval; correctness does not depend on it.
#[derive(Clone)]
pub struct LockConfig<S: Sleep = TokioSleep> {
    /// Fixed polling interval
    pub poll_interval: Duration,
    /// Sleep implementation
    pub sleep: S,
}

impl<S: Sleep> LockConfig<S> {
    /// Create a config with a custom sleep implementation.
    pub fn new(poll_interval: Duration, sleep: S) -> Self {
        Self {
            poll_interval,
            sleep,
        }
    }
}

impl Default for LockConfig<TokioSleep> {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            sleep: TokioSleep,
        }
    }
}

impl LockConfig<TokioSleep> {
    /// Tokio-backed config with the given polling interval.
    #[must_use]
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            sleep: TokioSleep,
        }
    }
}
