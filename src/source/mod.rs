//! # Data sources: the pluggable "fetch one reading" strategy.
//!
//! - [`DataSource`] trait consumed by the [`Supervisor`](crate::Supervisor)
//! - [`SourceFn`] closure-backed implementation (synthetic generators, tests, glue)
//!
//! Hardware readers (serial ports etc.) implement [`DataSource`] directly and are
//! selected at composition time; the supervisor never knows which one it drives.

mod data_source;
mod source_fn;

pub use data_source::DataSource;
pub use source_fn::SourceFn;
