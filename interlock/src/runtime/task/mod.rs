//! Asynchronous task primitives.
//!
//! A task is a future spawned onto the runtime. It is polled by the worker
//! threads, rescheduled by its waker, and observed through a [`JoinHandle`].
//!
//! Panics inside a task are caught and reported through the handle as a
//! [`JoinError`](crate::error::JoinError); the worker thread survives.

mod core;
mod handle;
mod state;
mod waker;

pub(crate) use self::core::{Runnable, Task, spawn_on};

pub use self::core::spawn;
pub use handle::JoinHandle;
