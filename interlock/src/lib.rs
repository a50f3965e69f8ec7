//! # Interlock
//!
//! **Interlock** provides fair asynchronous locks for the **Nebula** ecosystem:
//! a readers/writer lock, [`SharedMutex`](sync::SharedMutex), and a plain
//! exclusive lock, [`Mutex`](sync::Mutex), built on top of it.
//!
//! Lock requests that cannot be granted right away wait in a single FIFO
//! queue. Consecutive shared requests are granted together, and a waiting
//! exclusive request keeps later shared requests from overtaking it, so
//! neither readers nor writers starve.
//!
//! The locks are runtime-agnostic futures. The crate also ships a small
//! multi-threaded runtime to drive them, offering:
//!
//! - A **worker pool** with task spawning, join handles and abort
//! - **Timer primitives**: sleep and timeout, e.g. to give up on a lock
//! - **Ergonomic macros**: `#[interlock::main]` and `#[interlock::test]`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use interlock::sync::SharedMutex;
//! use interlock::task;
//!
//! #[interlock::main]
//! async fn main() {
//!     let lock = SharedMutex::new();
//!
//!     let reader = {
//!         let lock = lock.clone();
//!         task::spawn(async move {
//!             lock.run_shared(|| async { println!("reading") }).await
//!         })
//!     };
//!
//!     lock.run_exclusive(|| async { println!("writing") }).await;
//!     reader.await.unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sync`]: Lock primitives
//! - [`time`]: Sleep and timeout
//! - [`task`]: Spawning and joining tasks
//! - [`error`]: Errors reported by tasks and timers
//!
//! ## Logging
//!
//! Interlock emits [`tracing`] events: `trace` for lock grants and
//! releases, `debug` for runtime start and stop, and `error` for panicking
//! tasks. Install any subscriber to see them.

mod runtime;
mod utils;

pub mod error;
pub mod sync;
pub mod time;

pub use runtime::Runtime;
pub use runtime::builder::{RuntimeBuilder, WORKER_THREADS_ENV};
pub use runtime::task;
pub use runtime::yield_now::yield_now;

pub use interlock_macros::*;
