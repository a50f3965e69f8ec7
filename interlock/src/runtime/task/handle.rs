use crate::error::JoinError;
use crate::runtime::task::Task;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A handle to a spawned task.
///
/// A `JoinHandle` allows awaiting the result of a task spawned onto
/// the runtime. It implements [`Future`] and resolves once the task
/// has completed, panicked or been aborted.
///
/// Dropping the `JoinHandle` does **not** cancel the task; it only
/// discards the ability to observe its result.
pub struct JoinHandle<T> {
    /// Shared reference to the underlying task.
    pub(crate) task: Arc<Task<T>>,
}

impl<T: Send + 'static> JoinHandle<T> {
    /// Aborts the task.
    ///
    /// A task parked on a lock or a timer has its future dropped, which
    /// withdraws any pending lock request and releases any lock it holds.
    /// Awaiting the handle afterwards yields [`JoinError::Cancelled`],
    /// unless the task completed first.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Returns `true` once the task has completed or been aborted.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T: Send + 'static> Future for JoinHandle<T> {
    /// The outcome of the spawned task.
    type Output = Result<T, JoinError>;

    /// Polls the join handle.
    ///
    /// The waker is registered **before** re-checking the task outcome
    /// to avoid missed wake-ups.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.task.take_output() {
            return Poll::Ready(outcome);
        }

        self.task.register_join(cx.waker());

        if let Some(outcome) = self.task.take_output() {
            return Poll::Ready(outcome);
        }

        Poll::Pending
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle").finish_non_exhaustive()
    }
}
