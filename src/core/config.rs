//! # Supervisor configuration.
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for the loop at all; cleanup runs right away
//! - `error_backoff = None` → retry transient failures immediately
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Runtime settings for a [`Supervisor`](crate::Supervisor).
#[derive(Clone, Debug)]
pub struct Config {
    /// How long `stop()` waits for the loop to observe cancellation before it
    /// runs cleanup regardless.
    pub grace: Duration,

    /// Capacity of the lifecycle event bus ring buffer.
    ///
    /// Receivers lagging more than this many events skip the oldest ones.
    pub bus_capacity: usize,

    /// Optional delay after consecutive transient fetch failures.
    ///
    /// `None` keeps the plain contract: the source paces itself and the loop
    /// fetches again immediately. Set it for sources that can fail instantly.
    pub error_backoff: Option<BackoffPolicy>,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Sets the default grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Enables the safety backoff.
    pub fn with_error_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.error_backoff = Some(backoff);
        self
    }
}

impl Default for Config {
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `error_backoff = None`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            error_backoff: None,
        }
    }
}
