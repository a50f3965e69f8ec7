//! Synchronization primitives for Interlock.
//!
//! This module provides async-aware locks for serializing access to shared
//! state from many tasks, without blocking threads.
//!
//! The primitives are:
//! - [`SharedMutex`]: a fair readers/writer lock handing out [`SharedLock`]s.
//! - [`Mutex`]: a plain exclusive lock built on a [`SharedMutex`].
//!
//! ## Design notes
//!
//! - Locks are capabilities: they grant the right to touch a resource but do
//!   not own it. Taking the right kind of lock first is up to the caller.
//! - Requests that cannot be granted on the spot wait in one FIFO queue.
//!   Consecutive shared requests are activated together; an exclusive
//!   request that has to wait blocks later shared requests from overtaking it.
//! - A request takes its place in the queue when it is made, not when its
//!   future is first polled. Dropping the future withdraws it.
//! - The locks are not reentrant and cannot be upgraded: a task holding a
//!   shared lock that asks for an exclusive one waits for its own shared
//!   lock to be released, like everybody else.
//! - Handles release on drop, and `release()` is idempotent.
//! - The bookkeeping sits behind a standard `Mutex`, so the primitives are
//!   safe to share between threads and tasks, with or without `Arc`.

mod lock;
mod mutex;
mod shared_mutex;
mod state;

pub use lock::SharedLock;
pub use mutex::{Lock, LockFuture, Mutex};
pub use shared_mutex::{Acquire, SharedMutex};
pub use state::Mode;
