//! # Supervisor: lifecycle of one acquisition loop.
//!
//! The [`Supervisor`] owns a [`DataSource`], the [`SharedStore`] it feeds, and the
//! lifecycle event [`Bus`]. It runs the source's hooks, spawns the acquisition loop
//! on its own task, and stops it with a bounded grace period.
//!
//! ## States
//! ```text
//!            start()                 hook ok
//! Stopped ───────────► Starting ───────────────► Running
//!    ▲                    │ hook failed             │ stop(grace)
//!    │                    ▼                         ▼
//!    └──────────────── Stopped ◄──── cleanup ◄── Stopping
//! ```
//! `Stopped` is re-enterable: every `start()` spawns a fresh loop with a fresh
//! cancellation token.
//!
//! ## Shutdown path
//! ```text
//! stop(grace)
//!   ├─► publish StopRequested, token.cancel()
//!   ├─► timeout(grace, join loop):
//!   │      ├─ joined, clean     → StoppedWithinGrace, Ok(())
//!   │      ├─ joined, crashed   → Err(LoopCrashed)
//!   │      └─ elapsed           → GraceExceeded, loop detached, Err(GraceExceeded)
//!   ├─► source.after_stop()     (exactly once, in every case above)
//!   └─► publish CleanupFinished, state = Stopped
//! ```
//!
//! ## Known race
//! When the grace period elapses the loop is detached, not aborted: cleanup may
//! run while a fetch is still in flight, and that fetch may still publish one
//! reading before the loop sees the cancelled token. Sources that need a stricter
//! guarantee must make `fetch_one` honor its token promptly.
//!
//! A detached loop is still tracked: `start()` fails with
//! [`RuntimeError::PreviousLoopActive`] until it has ended, so the store never has
//! two writers.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{sync::broadcast, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::core::acquisition::{AcquisitionLoop, LoopCrash};
use crate::core::builder::SupervisorBuilder;
use crate::core::{Config, signals};
use crate::observers::panic_message;
use crate::{
    error::{FetchError, RuntimeError},
    events::{Bus, Event, EventKind},
    source::DataSource,
    store::SharedStore,
};

/// Lifecycle state of a [`Supervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl SupervisorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorState::Stopped => "stopped",
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Stopping => "stopping",
        }
    }
}

/// Handles of a spawned loop.
struct ActiveLoop {
    /// Cancels the loop.
    token: CancellationToken,
    /// Cancelled by the loop task itself when it ends (normally, crashed or panicked).
    finished: CancellationToken,
    handle: JoinHandle<Result<u64, LoopCrash>>,
}

struct Inner {
    state: SupervisorState,
    active: Option<ActiveLoop>,
    /// `finished` token of a loop that outlived its grace period.
    detached: Option<CancellationToken>,
}

impl Inner {
    fn detached_alive(&self) -> bool {
        self.detached.as_ref().is_some_and(|f| !f.is_cancelled())
    }
}

/// Puts the supervisor back to `Stopped` when `stop` completes or is dropped,
/// remembering the loop if it has not ended yet.
struct StoppingGuard<'a> {
    inner: &'a Mutex<Inner>,
    finished: Option<CancellationToken>,
}

impl Drop for StoppingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        inner.state = SupervisorState::Stopped;
        inner.detached = self.finished.take().filter(|f| !f.is_cancelled());
    }
}

/// Drives one [`DataSource`] into one [`SharedStore`].
pub struct Supervisor<S: DataSource> {
    cfg: Config,
    source: Arc<S>,
    store: Arc<SharedStore<S::Payload>>,
    bus: Bus,
    observer_token: CancellationToken,
    inner: Mutex<Inner>,
}

impl<S: DataSource> Supervisor<S> {
    /// Starts building a supervisor for `source`.
    pub fn builder(source: Arc<S>) -> SupervisorBuilder<S> {
        SupervisorBuilder::new(source)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        source: Arc<S>,
        store: Arc<SharedStore<S::Payload>>,
        bus: Bus,
        observer_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            source,
            store,
            bus,
            observer_token,
            inner: Mutex::new(Inner {
                state: SupervisorState::Stopped,
                active: None,
                detached: None,
            }),
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.inner.lock().state
    }

    /// True while a spawned loop (running or detached by `stop`) has not ended yet.
    pub fn is_loop_active(&self) -> bool {
        let inner = self.inner.lock();
        inner.detached_alive()
            || inner
                .active
                .as_ref()
                .is_some_and(|a| !a.finished.is_cancelled())
    }

    /// The store this supervisor publishes into.
    pub fn store(&self) -> &Arc<SharedStore<S::Payload>> {
        &self.store
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// New receiver of lifecycle events published from now on.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs the pre-loop hook, then spawns the acquisition loop.
    ///
    /// Returns once the loop is spawned; it does not wait for any fetch.
    /// The returned future should be driven to completion: dropping it while the
    /// hook runs leaves the supervisor in `Starting`.
    ///
    /// # Errors
    /// - [`RuntimeError::AlreadyRunning`] unless the supervisor is stopped;
    /// - [`RuntimeError::PreviousLoopActive`] while a loop detached by `stop` is
    ///   still running;
    /// - [`RuntimeError::SetupFailed`] if the hook failed (state returns to stopped).
    pub async fn start(&self) -> Result<(), RuntimeError> {
        {
            let mut inner = self.inner.lock();
            if inner.state != SupervisorState::Stopped {
                return Err(RuntimeError::AlreadyRunning {
                    state: inner.state.as_str(),
                });
            }
            if inner.detached_alive() {
                return Err(RuntimeError::PreviousLoopActive);
            }
            inner.detached = None;
            inner.state = SupervisorState::Starting;
        }
        let name = self.source.name();
        log::info!(target: "feedvisor", "[{name}] starting");
        self.bus
            .publish(Event::new(EventKind::Starting).with_source(name));

        if let Err(err) = self.source.before_start().await {
            self.inner.lock().state = SupervisorState::Stopped;
            log::error!(target: "feedvisor", "[{name}] {err}");
            self.bus.publish(
                Event::new(EventKind::SetupFailed)
                    .with_source(name)
                    .with_reason(err.reason.as_str()),
            );
            return Err(err.into());
        }

        let active = self.spawn_loop();
        {
            let mut inner = self.inner.lock();
            inner.active = Some(active);
            inner.state = SupervisorState::Running;
        }
        log::info!(target: "feedvisor", "[{name}] running");
        self.bus
            .publish(Event::new(EventKind::Running).with_source(name));
        Ok(())
    }

    /// Spawns the loop task; panics and fatal errors are reported from inside it.
    fn spawn_loop(&self) -> ActiveLoop {
        let token = CancellationToken::new();
        let finished = CancellationToken::new();

        let acquisition = AcquisitionLoop::new(
            Arc::clone(&self.source),
            Arc::clone(&self.store),
            self.bus.clone(),
            self.cfg.error_backoff,
        );
        let guard = finished.clone().drop_guard();
        let loop_token = token.clone();
        let bus = self.bus.clone();
        let name: Arc<str> = Arc::from(self.source.name());

        let handle = tokio::spawn(async move {
            let _finished = guard;
            let res = match AssertUnwindSafe(acquisition.run(loop_token))
                .catch_unwind()
                .await
            {
                Ok(res) => res,
                Err(panic_err) => Err(LoopCrash {
                    cycle: None,
                    error: FetchError::fatal(format!(
                        "panic: {}",
                        panic_message(panic_err.as_ref())
                    )),
                }),
            };

            if let Err(crash) = &res {
                log::error!(target: "feedvisor", "[{name}] acquisition loop crashed: {}", crash.error);
                let mut ev = Event::new(EventKind::LoopCrashed)
                    .with_source(Arc::clone(&name))
                    .with_reason(crash.error.to_string());
                if let Some(cycle) = crash.cycle {
                    ev = ev.with_cycle(cycle);
                }
                bus.publish(ev);
            }
            res
        });

        ActiveLoop {
            token,
            finished,
            handle,
        }
    }

    /// Stops the loop using [`Config::grace`].
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        self.stop_with_grace(self.cfg.grace).await
    }

    /// Cancels the loop, waits at most `grace` for it, then runs the cleanup hook.
    ///
    /// Returns within `grace` plus the duration of the cleanup hook, whatever the
    /// source does. The cleanup hook runs exactly once per call that finds the
    /// supervisor running and is driven to completion. Dropping the returned
    /// future early skips the hook but still leaves the supervisor stopped.
    ///
    /// # Errors
    /// - [`RuntimeError::NotRunning`] if the supervisor is not running (no hook runs);
    /// - [`RuntimeError::GraceExceeded`] if the loop was still running at the deadline;
    /// - [`RuntimeError::LoopCrashed`] if the loop had terminated on a fatal failure.
    pub async fn stop_with_grace(&self, grace: Duration) -> Result<(), RuntimeError> {
        let active = {
            let mut inner = self.inner.lock();
            if inner.state != SupervisorState::Running {
                return Err(RuntimeError::NotRunning);
            }
            inner.state = SupervisorState::Stopping;
            inner.active.take()
        };
        let _restore = StoppingGuard {
            inner: &self.inner,
            finished: active.as_ref().map(|a| a.finished.clone()),
        };
        let name = self.source.name();

        let outcome = match active {
            Some(active) => self.cancel_and_join(active, grace).await,
            None => Ok(()),
        };

        self.source.after_stop().await;
        log::info!(target: "feedvisor", "[{name}] cleanup finished");
        self.bus
            .publish(Event::new(EventKind::CleanupFinished).with_source(name));
        outcome
    }

    async fn cancel_and_join(&self, active: ActiveLoop, grace: Duration) -> Result<(), RuntimeError> {
        let name = self.source.name();
        let ActiveLoop {
            token, mut handle, ..
        } = active;

        log::info!(target: "feedvisor", "[{name}] stop requested (grace {grace:?})");
        self.bus.publish(
            Event::new(EventKind::StopRequested)
                .with_source(name)
                .with_grace(grace),
        );
        token.cancel();

        match time::timeout(grace, &mut handle).await {
            Ok(Ok(Ok(_cycles))) => {
                self.bus
                    .publish(Event::new(EventKind::StoppedWithinGrace).with_source(name));
                Ok(())
            }
            Ok(Ok(Err(crash))) => Err(RuntimeError::LoopCrashed {
                error: crash.error.to_string(),
            }),
            Ok(Err(join_err)) => Err(RuntimeError::LoopCrashed {
                error: join_err.to_string(),
            }),
            Err(_elapsed) => {
                log::warn!(
                    target: "feedvisor",
                    "[{name}] loop still running after {grace:?}; detaching it and cleaning up"
                );
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_source(name)
                        .with_grace(grace),
                );
                Err(RuntimeError::GraceExceeded { grace })
            }
        }
    }

    /// Starts, waits for an OS termination signal (or for the loop to end on its
    /// own), then stops with [`Config::grace`].
    pub async fn run_until_shutdown(&self) -> Result<(), RuntimeError> {
        self.start().await?;

        let finished = self
            .inner
            .lock()
            .active
            .as_ref()
            .map(|a| a.finished.clone())
            .unwrap_or_default();
        let name = self.source.name();

        tokio::select! {
            res = signals::wait_for_shutdown_signal() => match res {
                Ok(()) => log::info!(target: "feedvisor", "[{name}] shutdown signal received"),
                Err(e) => {
                    log::error!(target: "feedvisor", "[{name}] cannot listen for shutdown signals: {e}");
                    finished.cancelled().await;
                }
            },
            _ = finished.cancelled() => {
                log::warn!(target: "feedvisor", "[{name}] acquisition loop ended on its own");
            }
        }
        self.stop().await
    }
}

impl<S: DataSource> Drop for Supervisor<S> {
    fn drop(&mut self) {
        if let Some(active) = self.inner.get_mut().active.take() {
            active.token.cancel();
        }
        self.observer_token.cancel();
    }
}
