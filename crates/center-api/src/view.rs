//! Load/refresh contract shared by every data-backed view
//!
//! A `BoundView` is bound to one resource for its whole life. Each `load`
//! takes a generation number; a result is applied only if the view is still
//! mounted and no newer load has started since. `unmount` ends the view's
//! lifetime and drops any in-flight fetch at its next await point.
//!
//! Writes are sequenced: the refresh starts only after the write response
//! has arrived, and a failed write leaves the current state untouched.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::Result;
use crate::notice::Notices;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    /// Read failed; the view renders its empty/error state
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// What happened to a load's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load started first; this result was discarded
    Stale,
    /// The view was unmounted before the result arrived
    Cancelled,
}

/// Read-only handle on a view's mounted flag.
#[derive(Debug, Clone)]
pub struct ViewLifetime(watch::Receiver<bool>);

impl ViewLifetime {
    pub fn is_mounted(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the view is unmounted (or gone).
    pub async fn ended(&mut self) {
        let _ = self.0.wait_for(|mounted| !*mounted).await;
    }
}

struct Inner<T> {
    resource: &'static str,
    state: Mutex<ViewState<T>>,
    generation: AtomicU64,
    mounted: watch::Sender<bool>,
}

/// Shared handle on one view's state. Clones refer to the same view.
pub struct BoundView<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for BoundView<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> BoundView<T> {
    /// Mounted view for `resource`, in `Loading` until the first load lands.
    pub fn new(resource: &'static str) -> Self {
        let (mounted, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                resource,
                state: Mutex::new(ViewState::Loading),
                generation: AtomicU64::new(0),
                mounted,
            }),
        }
    }

    pub fn lifetime(&self) -> ViewLifetime {
        ViewLifetime(self.inner.mounted.subscribe())
    }

    pub fn is_mounted(&self) -> bool {
        *self.inner.mounted.borrow()
    }

    /// End the view's lifetime. In-flight loads resolve as `Cancelled` and
    /// never touch the state again.
    pub fn unmount(&self) {
        self.inner.mounted.send_replace(false);
        debug!(resource = self.inner.resource, "view unmounted");
    }

    fn lock(&self) -> MutexGuard<'_, ViewState<T>> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    /// Issue one read and apply its result if it is still wanted.
    pub async fn load<F>(&self, fetch: F) -> LoadOutcome
    where
        F: Future<Output = Result<T>>,
    {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut lifetime = self.lifetime();
        if !lifetime.is_mounted() {
            return LoadOutcome::Cancelled;
        }
        *self.lock() = ViewState::Loading;

        let result = tokio::select! {
            result = fetch => result,
            () = lifetime.ended() => {
                debug!(resource = self.inner.resource, generation, "load cancelled");
                return LoadOutcome::Cancelled;
            }
        };

        if !lifetime.is_mounted() {
            return LoadOutcome::Cancelled;
        }
        if !self.is_current(generation) {
            debug!(resource = self.inner.resource, generation, "discarding stale load");
            return LoadOutcome::Stale;
        }

        let next = match result {
            Ok(value) => ViewState::Ready(value),
            Err(e) => {
                warn!(resource = self.inner.resource, error = %e, "load failed");
                ViewState::Failed(e.to_string())
            }
        };
        *self.lock() = next;
        LoadOutcome::Applied
    }

    /// Run a write, post its notice, then refresh from the backend.
    ///
    /// `refresh` is only called once `write` has resolved successfully. On
    /// failure the state is left as it was and an error notice is posted.
    pub async fn write<U, W, R, RF>(
        &self,
        notices: &Notices,
        write: W,
        refresh: R,
        success: &str,
        failure: &str,
    ) -> Result<U>
    where
        W: Future<Output = Result<U>>,
        R: FnOnce() -> RF,
        RF: Future<Output = Result<T>>,
    {
        match write.await {
            Ok(response) => {
                notices.success(success);
                self.load(refresh()).await;
                Ok(response)
            }
            Err(e) => {
                warn!(resource = self.inner.resource, error = %e, "write failed");
                notices.error(format!("{failure}: {e}"));
                Err(e)
            }
        }
    }
}

impl<T: Clone> BoundView<T> {
    /// Snapshot of the current state.
    pub fn state(&self) -> ViewState<T> {
        self.lock().clone()
    }
}
