//! Retry pacing for transient fetch failures.
//!
//! By default the acquisition loop retries a failed cycle **immediately**: the
//! source owns its pacing and is expected to block until the next sample is due.
//! Sources that can fail instantly (an unplugged serial port returning EOF) turn
//! that into a hot loop; [`Config::error_backoff`](crate::Config::error_backoff)
//! opts into a delay computed by [`BackoffPolicy`].
//!
//! ## Contents
//! - [`BackoffPolicy`] delay as a function of the consecutive-failure streak
//! - [`JitterPolicy`]  randomization of that delay
//!
//! ## Wiring
//! ```text
//! Config { error_backoff: Option<BackoffPolicy> }
//!      └─► core::acquisition loop:
//!           - success          → streak = 0
//!           - NoData/Malformed → streak += 1; sleep(backoff.delay_for(streak)) if configured
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
