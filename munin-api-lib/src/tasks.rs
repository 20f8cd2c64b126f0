//! Background task tracking for coordinated shutdown.
//!
//! Work that must finish before the process stops registers here. The server
//! waits on the tracker during its drain phase; a registration that never
//! completes holds shutdown open until the deadline, surfacing stuck work as
//! a timeout instead of silently dropping it.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;

/// Tracks in-flight background work.
///
/// Clones share the same underlying tracker, so any subsystem can hold a
/// handle and register work from any task.
#[derive(Clone, Debug, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

/// RAII registration for one unit of background work.
///
/// Dropping the guard is the completion notification. Drop runs whether the
/// work succeeded, failed, or panicked, so the tracker count always returns
/// to zero once the work is truly gone.
#[derive(Debug)]
pub struct TaskGuard {
    _token: TaskTrackerToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self { tracker: TaskTracker::new() }
    }

    /// Register one unit of work. Hold the guard for the work's lifetime.
    pub fn register(&self) -> TaskGuard {
        TaskGuard { _token: self.tracker.token() }
    }

    /// Spawn a tracked task on the runtime.
    ///
    /// The registration is released when the task finishes, even if it
    /// panics. Whether the task succeeded is the task's own business; the
    /// tracker only observes completion.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(future)
    }

    /// Number of registrations that have not completed yet.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Close the tracker so [`wait`](Self::wait) can resolve.
    ///
    /// Called once when shutdown begins. Registering after close still
    /// works; `wait` resolves only when the tracker is both closed and
    /// empty.
    pub fn close(&self) {
        self.tracker.close();
    }

    /// Wait until the tracker is closed and every registration completed.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }
}
