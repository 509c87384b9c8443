//! # Observer trait.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for lifecycle event observers.
///
/// Called from an observer-dedicated worker task; slow observers only delay
/// themselves. When the queue overflows, events for that observer are dropped
/// and an `ObserverOverflow` event is published.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use feedvisor::{Event, EventKind, Observe};
///
/// struct SkipCounter(std::sync::atomic::AtomicU64);
///
/// #[async_trait]
/// impl Observe for SkipCounter {
///     async fn on_event(&self, ev: &Event) {
///         if matches!(ev.kind, EventKind::NoDataAvailable | EventKind::MalformedData) {
///             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         }
///     }
///     fn name(&self) -> &'static str { "skip-counter" }
/// }
/// ```
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/events).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this observer's queue.
    fn queue_capacity(&self) -> usize {
        256
    }
}
