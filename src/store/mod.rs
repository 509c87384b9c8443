//! # Shared state: the latest reading and its subscribers.
//!
//! [`SharedStore`] is the single point of truth for "latest known state".
//! Only the acquisition loop writes to it; everything else reads [`SharedStore::current`]
//! or reacts to notifications registered with [`SharedStore::subscribe`].
//!
//! ```text
//! loop cycle n ──► publish(reading_n) ──► notify_all()
//!                                            ├──► callback 1 ──► current() == reading_n
//!                                            ├──► callback 2
//!                                            └──► callback N
//! ```

mod shared;
mod subscription;

pub use shared::{FanOut, SharedStore};
pub use subscription::SubscriptionId;
