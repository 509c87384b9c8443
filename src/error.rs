//! Error types used by the acquisition supervisor and data sources.
//!
//! - [`FetchError`]: outcome of a single fetch cycle that did not yield a reading.
//! - [`SetupError`]: the pre-loop hook of a source failed.
//! - [`RuntimeError`]: errors raised by the supervisor lifecycle itself.
//!
//! All of them provide `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by one fetch cycle.
///
/// Two variants are **transient** ([`FetchError::NoData`], [`FetchError::Malformed`]):
/// the loop logs them, skips the cycle and fetches again.
/// [`FetchError::Canceled`] ends the loop normally.
/// Everything else is fatal and terminates the background loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FetchError {
    /// No new sample arrived (e.g. read timeout on the device channel).
    #[error("no data available: {reason}")]
    NoData {
        /// What the source was waiting for.
        reason: String,
    },

    /// Something arrived, but it could not be turned into a reading.
    #[error("malformed data ({reason}): {raw:?}")]
    Malformed {
        /// Raw payload as received, kept for diagnostics only.
        raw: String,
        /// Parse/checksum failure description.
        reason: String,
    },

    /// The source observed cancellation.
    #[error("fetch cancelled")]
    Canceled,

    /// Device I/O failed in a way retrying cannot fix.
    #[error("device i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Unclassified source failure.
    #[error("fatal source error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl FetchError {
    /// Shorthand for [`FetchError::NoData`].
    pub fn no_data(reason: impl Into<String>) -> Self {
        FetchError::NoData {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`FetchError::Malformed`].
    pub fn malformed(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::Malformed {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Builds [`FetchError::Malformed`] from raw bytes (lossy UTF-8).
    pub fn malformed_bytes(raw: &[u8], reason: impl Into<String>) -> Self {
        Self::malformed(String::from_utf8_lossy(raw), reason)
    }

    /// Shorthand for [`FetchError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        FetchError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use feedvisor::FetchError;
    ///
    /// assert_eq!(FetchError::no_data("timeout").as_label(), "fetch_no_data");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::NoData { .. } => "fetch_no_data",
            FetchError::Malformed { .. } => "fetch_malformed",
            FetchError::Canceled => "fetch_canceled",
            FetchError::Io(_) => "fetch_io",
            FetchError::Fatal { .. } => "fetch_fatal",
        }
    }

    /// True for outcomes that skip the cycle and keep the loop alive.
    ///
    /// # Example
    /// ```
    /// use feedvisor::FetchError;
    ///
    /// assert!(FetchError::malformed("$$", "bad checksum").is_transient());
    /// assert!(!FetchError::Canceled.is_transient());
    /// assert!(!FetchError::fatal("port vanished").is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::NoData { .. } | FetchError::Malformed { .. })
    }
}

/// Failure of a source's pre-loop hook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("source setup failed: {reason}")]
pub struct SetupError {
    /// Human-readable cause.
    pub reason: String,
}

impl SetupError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// # Errors produced by the supervisor lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `start` was called while the supervisor was not stopped.
    #[error("supervisor is already {state}")]
    AlreadyRunning {
        /// State observed when `start` was rejected.
        state: &'static str,
    },

    /// `start` was called while a loop detached by an earlier `stop` is still
    /// inside its fetch; a second loop would be a second writer on the store.
    #[error("previous acquisition loop is still running")]
    PreviousLoopActive,

    /// `stop` was called on a stopped supervisor.
    #[error("supervisor is not running")]
    NotRunning,

    /// The pre-loop hook failed; the loop was never started.
    #[error(transparent)]
    SetupFailed(#[from] SetupError),

    /// The loop did not exit within the grace period; it was detached, cleanup ran anyway.
    #[error("acquisition loop still running after grace period {grace:?}")]
    GraceExceeded {
        /// The grace period that elapsed.
        grace: Duration,
    },

    /// The loop terminated on an unclassified source failure or a panic.
    #[error("acquisition loop crashed: {error}")]
    LoopCrashed {
        /// Failure description.
        error: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use feedvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyRunning { .. } => "runtime_already_running",
            RuntimeError::PreviousLoopActive => "runtime_previous_loop_active",
            RuntimeError::NotRunning => "runtime_not_running",
            RuntimeError::SetupFailed(_) => "runtime_setup_failed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::LoopCrashed { .. } => "runtime_loop_crashed",
        }
    }
}
