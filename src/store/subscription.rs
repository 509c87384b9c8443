//! Subscriber bookkeeping for [`SharedStore`](crate::SharedStore).

use std::fmt;
use std::sync::Arc;

/// Zero-argument notification callback.
pub(crate) type Callback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`SharedStore::subscribe`](crate::SharedStore::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Registration-ordered subscriber list.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback)>,
}

impl Subscribers {
    pub(crate) fn insert(&mut self, cb: Callback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, cb));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(sid, _)| *sid != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Clones the list so callbacks run without holding the lock.
    pub(crate) fn snapshot(&self) -> Vec<(SubscriptionId, Callback)> {
        self.entries.clone()
    }
}
