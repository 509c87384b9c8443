//! Runtime core: supervision of the acquisition loop.
//!
//! The only public API from this module is [`Supervisor`] (with its builder,
//! state and [`Config`]).
//!
//! Internal modules:
//! - [`supervisor`]: lifecycle, hooks, bounded shutdown;
//! - [`acquisition`]: the fetch/classify/publish loop;
//! - [`builder`]: wiring of bus, store and observers;
//! - [`signals`]: OS termination signals for `run_until_shutdown`.

mod acquisition;
mod builder;
mod config;
mod signals;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::Config;
pub use supervisor::{Supervisor, SupervisorState};
