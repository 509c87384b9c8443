//! # Data source contract.
//!
//! A source has three capabilities: an optional pre-loop hook, a (possibly
//! long-blocking) fetch, and an optional post-loop hook. The supervisor holds it
//! as a strategy object; it is never subclassed.
//!
//! ## Fetch contract
//! - return `Ok(reading)` when a sample is ready;
//! - return [`FetchError::NoData`] / [`FetchError::Malformed`] for transient problems;
//! - return [`FetchError::Canceled`] once `ctx` is cancelled;
//! - may block, but must not busy-spin: the source owns its pacing, the loop adds
//!   no delay between cycles.
//!
//! Wrap genuinely blocking I/O in [`tokio::task::spawn_blocking`] and race it with
//! `ctx.cancelled()`; a source that ignores `ctx` delays shutdown until its current
//! fetch returns.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, SetupError};
use crate::reading::Reading;

/// # Pluggable producer of [`Reading`]s.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use feedvisor::{DataSource, FetchError, Reading};
///
/// struct Thermometer;
///
/// #[async_trait]
/// impl DataSource for Thermometer {
///     type Payload = f32;
///
///     fn name(&self) -> &str { "thermometer" }
///
///     async fn fetch_one(&self, ctx: CancellationToken) -> Result<Reading<f32>, FetchError> {
///         tokio::select! {
///             _ = ctx.cancelled() => Err(FetchError::Canceled),
///             _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => Ok(Reading::now(21.0)),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Domain-specific measurement fields.
    type Payload: Send + Sync + 'static;

    /// Stable, human-readable name (logs and events).
    fn name(&self) -> &str;

    /// Setup that must complete before fetching starts (open port, configure device).
    ///
    /// A failure aborts `start()`.
    async fn before_start(&self) -> Result<(), SetupError> {
        Ok(())
    }

    /// Fetches the next reading, blocking until one is available.
    async fn fetch_one(&self, ctx: CancellationToken)
    -> Result<Reading<Self::Payload>, FetchError>;

    /// Best-effort cleanup after `stop()`.
    ///
    /// There is no guarantee the loop has exited when this runs: if the grace
    /// period elapsed, a fetch may still be in flight.
    async fn after_stop(&self) {}
}
