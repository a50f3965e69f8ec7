//! Error types surfaced by the runtime.
//!
//! Locking itself never fails: contention is reported as `None` by the
//! immediate acquisition methods, or simply by waiting. The errors below come
//! from the task runtime and timers.

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Error returned when awaiting a [`JoinHandle`](crate::task::JoinHandle)
/// whose task did not run to completion.
#[derive(Error)]
pub enum JoinError {
    /// The task panicked. Carries the panic payload.
    #[error("task panicked: {}", panic_message(.0.as_ref()))]
    Panicked(Box<dyn Any + Send + 'static>),

    /// The task was aborted before it completed.
    #[error("task was cancelled")]
    Cancelled,
}

impl JoinError {
    /// Returns `true` if the task panicked.
    pub fn is_panic(&self) -> bool {
        matches!(self, JoinError::Panicked(_))
    }

    /// Returns `true` if the task was aborted.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JoinError::Cancelled)
    }

    /// Consumes the error, returning the panic payload.
    ///
    /// # Panics
    ///
    /// Panics if the task was cancelled rather than panicking.
    pub fn into_panic(self) -> Box<dyn Any + Send + 'static> {
        match self {
            JoinError::Panicked(payload) => payload,
            JoinError::Cancelled => panic!("`JoinError::into_panic` called on a cancelled task"),
        }
    }
}

impl fmt::Debug for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::Panicked(payload) => f
                .debug_tuple("Panicked")
                .field(&panic_message(payload.as_ref()))
                .finish(),
            JoinError::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Error returned by [`timeout`](crate::time::timeout) when the deadline
/// passes before the future completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline has elapsed")]
pub struct Elapsed(pub(crate) ());

/// Best-effort extraction of a panic message.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
