//! # Function-backed data source (`SourceFn`)
//!
//! [`SourceFn`] wraps a closure `F: Fn(CancellationToken) -> Fut` producing a fresh
//! fetch future per cycle. Setup and cleanup hooks are optional closures.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use feedvisor::{DataSource, FetchError, Reading, SetupError, SourceFn};
//!
//! let src = SourceFn::new("synthetic", |ctx: CancellationToken| async move {
//!     tokio::select! {
//!         _ = ctx.cancelled() => Err(FetchError::Canceled),
//!         _ = tokio::time::sleep(Duration::from_millis(500)) => Ok(Reading::now(42u16)),
//!     }
//! })
//! .with_setup(|| async { Ok::<_, SetupError>(()) });
//!
//! assert_eq!(src.name(), "synthetic");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, SetupError};
use crate::reading::Reading;
use crate::source::DataSource;

type SetupHook = Box<dyn Fn() -> BoxFuture<'static, Result<(), SetupError>> + Send + Sync>;
type CleanupHook = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Closure-backed [`DataSource`].
pub struct SourceFn<F, P> {
    name: Cow<'static, str>,
    fetch: F,
    setup: Option<SetupHook>,
    cleanup: Option<CleanupHook>,
    _payload: PhantomData<fn() -> P>,
}

impl<F, P> SourceFn<F, P> {
    pub fn new(name: impl Into<Cow<'static, str>>, fetch: F) -> Self {
        Self {
            name: name.into(),
            fetch,
            setup: None,
            cleanup: None,
            _payload: PhantomData,
        }
    }

    /// Creates the source wrapped in an `Arc`.
    pub fn arc(name: impl Into<Cow<'static, str>>, fetch: F) -> Arc<Self> {
        Arc::new(Self::new(name, fetch))
    }

    /// Sets the pre-loop hook.
    pub fn with_setup<G, GF>(mut self, setup: G) -> Self
    where
        G: Fn() -> GF + Send + Sync + 'static,
        GF: Future<Output = Result<(), SetupError>> + Send + 'static,
    {
        self.setup = Some(Box::new(move || setup().boxed()));
        self
    }

    /// Sets the post-loop hook.
    pub fn with_cleanup<G, GF>(mut self, cleanup: G) -> Self
    where
        G: Fn() -> GF + Send + Sync + 'static,
        GF: Future<Output = ()> + Send + 'static,
    {
        self.cleanup = Some(Box::new(move || cleanup().boxed()));
        self
    }
}

#[async_trait]
impl<F, Fut, P> DataSource for SourceFn<F, P>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reading<P>, FetchError>> + Send + 'static,
    P: Send + Sync + 'static,
{
    type Payload = P;

    fn name(&self) -> &str {
        &self.name
    }

    async fn before_start(&self) -> Result<(), SetupError> {
        match &self.setup {
            Some(setup) => setup().await,
            None => Ok(()),
        }
    }

    async fn fetch_one(&self, ctx: CancellationToken) -> Result<Reading<P>, FetchError> {
        (self.fetch)(ctx).await
    }

    async fn after_stop(&self) {
        if let Some(cleanup) = &self.cleanup {
            cleanup().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn hooks_default_to_noops() {
        let src = SourceFn::new("plain", |_ctx: CancellationToken| async {
            Ok::<_, FetchError>(Reading::now(1u8))
        });
        assert!(src.before_start().await.is_ok());
        src.after_stop().await;
        let r = src.fetch_one(CancellationToken::new()).await.unwrap();
        assert_eq!(*r.payload(), 1);
    }

    #[tokio::test]
    async fn runs_configured_hooks() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let c = cleanups.clone();
        let src = SourceFn::new("hooked", |_ctx: CancellationToken| async {
            Err::<Reading<()>, _>(FetchError::no_data("idle"))
        })
        .with_setup(|| async { Err(SetupError::new("port busy")) })
        .with_cleanup(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert_eq!(src.before_start().await, Err(SetupError::new("port busy")));
        src.after_stop().await;
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    }
}
