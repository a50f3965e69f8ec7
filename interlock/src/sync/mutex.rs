use super::lock::SharedLock;
use super::shared_mutex::{Acquire, SharedMutex};
use super::state::Mode;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// An asynchronous mutex.
///
/// `Mutex` provides mutual exclusion for async tasks. Unlike a standard
/// `std::sync::Mutex`, it does not block threads while waiting: tasks that
/// cannot take the lock are suspended and resumed in the order they asked.
///
/// It is a [`SharedMutex`] that only ever hands out exclusive locks, so its
/// observable states reduce to locked and unlocked.
///
/// Cloning a `Mutex` yields another handle to the same lock.
///
/// # Example
/// ```rust,ignore
/// let mutex = Mutex::new();
///
/// let lock = mutex.acquire_lock().await;
/// assert!(mutex.acquire_lock_immediate().is_none());
/// lock.release();
/// ```
#[derive(Clone, Default)]
pub struct Mutex {
    shared: SharedMutex,
}

impl Mutex {
    /// Creates a new, unlocked mutex.
    pub fn new() -> Self {
        Self {
            shared: SharedMutex::new(),
        }
    }

    /// Returns a future that resolves to a [`Lock`] once the mutex is
    /// acquired.
    ///
    /// The request takes its place in the queue when this method is called.
    /// This does **not block the thread**; the awaiting task is suspended
    /// until the lock is handed to it.
    pub fn acquire_lock(&self) -> LockFuture {
        LockFuture {
            acquire: self.shared.acquire_exclusive_lock(),
        }
    }

    /// Attempts to acquire the lock without waiting.
    ///
    /// Returns `None` if the mutex is locked or has waiters.
    pub fn acquire_lock_immediate(&self) -> Option<Lock> {
        self.shared.acquire_exclusive_lock_immediate().map(Lock)
    }

    /// Runs `task` while holding the lock, releasing it on every exit path.
    ///
    /// # Example
    /// ```rust,ignore
    /// let value = mutex.run_exclusive(|| async { 42 }).await;
    /// assert_eq!(value, 42);
    /// ```
    pub fn run_exclusive<F, Fut>(&self, task: F) -> impl Future<Output = Fut::Output> + use<F, Fut>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.shared.run_exclusive(task)
    }

    /// Returns `true` while the lock is held or requested.
    pub fn is_locked(&self) -> bool {
        self.shared.mode() == Mode::Exclusive
    }

    /// Returns the number of tasks waiting for the lock.
    pub fn waiting(&self) -> usize {
        self.shared.waiting()
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("locked", &self.is_locked())
            .field("waiting", &self.waiting())
            .finish()
    }
}

/// Future returned by [`Mutex::acquire_lock`].
///
/// The future resolves to a [`Lock`] once the lock is acquired. Dropping it
/// beforehand gives up its place in the queue.
#[must_use = "a queued lock request does nothing unless awaited"]
#[derive(Debug)]
pub struct LockFuture {
    acquire: Acquire,
}

impl Future for LockFuture {
    type Output = Lock;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.acquire).poll(cx).map(Lock)
    }
}

/// Lock returned by [`Mutex::acquire_lock`] and [`Mutex::acquire_lock_immediate`].
///
/// Releases the mutex when dropped.
#[derive(Debug)]
pub struct Lock(SharedLock);

impl Lock {
    /// Releases the lock.
    ///
    /// Returns `true` the first time and `false` on every later call.
    pub fn release(&self) -> bool {
        self.0.release()
    }
}
