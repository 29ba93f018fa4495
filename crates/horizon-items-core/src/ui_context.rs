//! The designated UI execution context.
//!
//! All controller work, diffing and view mutation happen on one serial
//! context: a Tokio current-thread runtime driving a [`LocalSet`] on the
//! thread that created it. Pull-based producers are consumed by local tasks
//! spawned here, so every snapshot they yield is applied on that same thread
//! without any hand-off.
//!
//! # Example
//!
//! ```
//! use horizon_items_core::ui_context::{UiContext, UiContextConfig};
//!
//! let ctx = UiContext::new(UiContextConfig::default()).unwrap();
//!
//! let handle = ctx.spawn_local(async {
//!     // runs on this thread, interleaved only at await points
//! });
//!
//! assert!(ctx.block_on(handle.wait()));
//! ```
//!
//! The context itself is `!Send`: it cannot leave the thread it was built
//! on, and neither can anything spawned onto it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::{Builder, Runtime};
use tokio::sync::Notify;
use tokio::task::{JoinHandle, LocalSet};

use crate::error::UiContextError;
use crate::logging::targets;

/// Counter for unique task IDs.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration for the UI execution context.
#[derive(Debug, Clone)]
pub struct UiContextConfig {
    /// Name recorded on the context's tracing events.
    pub name: String,
    /// Enable the time driver (required for `tokio::time` in producers).
    pub enable_time: bool,
}

impl Default for UiContextConfig {
    fn default() -> Self {
        Self {
            name: "horizon-ui".to_string(),
            enable_time: true,
        }
    }
}

impl UiContextConfig {
    /// Set the context name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable the time driver.
    pub fn with_time(mut self, enabled: bool) -> Self {
        self.enable_time = enabled;
        self
    }
}

/// A handle to a task spawned on the UI context.
///
/// Dropping the handle detaches the task; it keeps running until its
/// producer completes. Use [`cancel`](Self::cancel) to stop it early.
#[derive(Debug)]
pub struct TaskHandle {
    id: u64,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Get the unique task ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancel the task.
    ///
    /// The task stops at its next suspension point; anything it already
    /// applied stays applied.
    pub fn cancel(&self) {
        self.join.abort();
    }

    /// Check whether the task has stopped, either by completing or by
    /// being cancelled.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to stop.
    ///
    /// Returns `true` if it ran to completion, `false` if it was cancelled.
    pub async fn wait(self) -> bool {
        match self.join.await {
            Ok(()) => true,
            Err(err) if err.is_cancelled() => false,
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}

/// The UI execution context.
///
/// Owns a current-thread runtime and the [`LocalSet`] on which UI-confined
/// tasks run. Tasks only make progress while the context is being driven
/// via [`block_on`](Self::block_on).
pub struct UiContext {
    runtime: Runtime,
    local: LocalSet,
    name: String,
    active_tasks: Arc<AtomicU64>,
    idle: Arc<Notify>,
}

impl UiContext {
    /// Create a new UI context on the current thread.
    pub fn new(config: UiContextConfig) -> Result<Self, UiContextError> {
        let mut builder = Builder::new_current_thread();
        if config.enable_time {
            builder.enable_time();
        }

        let runtime = builder.build().map_err(UiContextError::CreationFailed)?;

        tracing::debug!(target: targets::UI_CONTEXT, name = %config.name, "UI context created");

        Ok(Self {
            runtime,
            local: LocalSet::new(),
            name: config.name,
            active_tasks: Arc::new(AtomicU64::new(0)),
            idle: Arc::new(Notify::new()),
        })
    }

    /// Get the context name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of spawned tasks that have not stopped yet.
    pub fn active_tasks(&self) -> u64 {
        self.active_tasks.load(Ordering::Acquire)
    }

    /// Spawn a UI-confined task.
    ///
    /// The future does not need to be `Send`; it is polled only on this
    /// context's thread.
    pub fn spawn_local<F>(&self, future: F) -> TaskHandle
    where
        F: Future<Output = ()> + 'static,
    {
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        let active_tasks = self.active_tasks.clone();
        active_tasks.fetch_add(1, Ordering::AcqRel);

        let guard = ActiveTaskGuard {
            active_tasks,
            idle: self.idle.clone(),
        };
        let join = self.local.spawn_local(async move {
            let _guard = guard;
            future.await;
        });

        tracing::trace!(target: targets::UI_CONTEXT, task_id = id, "spawned local task");

        TaskHandle { id, join }
    }

    /// Drive the context until `future` completes.
    ///
    /// Spawned local tasks make progress while this runs.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async context.
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        self.local.block_on(&self.runtime, future)
    }

    /// Drive the context until every spawned task has stopped.
    ///
    /// Never returns while a task awaits something that never resolves,
    /// such as [`SnapshotStream::never`](crate::SnapshotStream::never).
    /// Cancel such tasks through their [`TaskHandle`] first.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async context.
    pub fn run_until_idle(&self) {
        let active_tasks = self.active_tasks.clone();
        let idle = self.idle.clone();
        self.block_on(async move {
            loop {
                // Register before checking so a wake-up in between is kept.
                let notified = idle.notified();
                if active_tasks.load(Ordering::Acquire) == 0 {
                    break;
                }
                notified.await;
            }
        });
    }
}

impl std::fmt::Debug for UiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiContext")
            .field("name", &self.name)
            .field("active_tasks", &self.active_tasks())
            .finish()
    }
}

/// Decrements the active task count when a task stops, including when it
/// is aborted mid-flight, and wakes [`UiContext::run_until_idle`] when the
/// last one goes.
struct ActiveTaskGuard {
    active_tasks: Arc<AtomicU64>,
    idle: Arc<Notify>,
}

impl Drop for ActiveTaskGuard {
    fn drop(&mut self) {
        if self.active_tasks.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}

static_assertions::assert_not_impl_any!(UiContext: Send, Sync);
