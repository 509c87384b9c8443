use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::{config::Config, supervisor::Supervisor};
use crate::{
    events::Bus,
    observers::{Observe, ObserverSet},
    source::DataSource,
    store::SharedStore,
};

/// Builder for a [`Supervisor`].
pub struct SupervisorBuilder<S: DataSource> {
    source: Arc<S>,
    cfg: Config,
    store: Option<Arc<SharedStore<S::Payload>>>,
    observers: Vec<Arc<dyn Observe>>,
}

impl<S: DataSource> SupervisorBuilder<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            cfg: Config::default(),
            store: None,
            observers: Vec::new(),
        }
    }

    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Publishes into an existing store instead of a fresh one.
    ///
    /// Useful when consumers (history, web handlers) are wired before the supervisor.
    pub fn with_store(mut self, store: Arc<SharedStore<S::Payload>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets lifecycle event observers.
    ///
    /// Each observer gets a dedicated worker with a bounded queue.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Builds the supervisor (stopped).
    ///
    /// With observers configured this spawns their workers, so it must then be
    /// called within a Tokio runtime.
    pub fn build(self) -> Supervisor<S> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let store = self.store.unwrap_or_default();
        let observer_token = CancellationToken::new();

        if !self.observers.is_empty() {
            observer_listener(
                ObserverSet::new(self.observers, bus.clone()),
                &bus,
                observer_token.clone(),
            );
        }
        Supervisor::new_internal(self.cfg, self.source, store, bus, observer_token)
    }
}

/// Forwards bus events to the observer set until `token` is cancelled.
fn observer_listener(set: ObserverSet, bus: &Bus, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(ev),
                    Err(RecvError::Lagged(n)) => {
                        log::warn!(target: "feedvisor", "observer listener lagged, skipped {n} events");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        set.shutdown().await;
    });
}
