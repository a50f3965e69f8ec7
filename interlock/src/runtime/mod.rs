//! Task runtime.
//!
//! A small multi-threaded runtime to drive futures that wait on the locks
//! of [`sync`](crate::sync):
//! - a pool of worker threads sharing one run queue,
//! - tasks with join handles, abort and panic capture,
//! - a timer driver thread behind [`time`](crate::time),
//! - cooperative yielding via [`yield_now`](crate::yield_now).

mod core;
mod executor;
mod queue;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
