use super::shared_mutex::Inner;
use crate::utils::Key;

use std::fmt;
use std::sync::Arc;

use tracing::trace;

/// A lock leased from a [`SharedMutex`](super::SharedMutex).
///
/// A `SharedLock` is a capability: holding it means the caller may touch
/// the resource the mutex guards, in the way its [`shared`](Self::shared)
/// flag allows. It carries no data.
///
/// The lock is returned with [`release`](Self::release), or automatically
/// when the handle is dropped, whichever happens first.
pub struct SharedLock {
    /// Bookkeeping of the mutex the lock was leased from.
    inner: Arc<Inner>,

    /// Identity of this lease in the mutex's active set.
    lease: Key,

    /// `true` for a shared (reader) lock, `false` for an exclusive one.
    shared: bool,
}

impl SharedLock {
    pub(crate) fn new(inner: Arc<Inner>, lease: Key, shared: bool) -> Self {
        Self {
            inner,
            lease,
            shared,
        }
    }

    /// Returns `true` if this is a shared lock, `false` if it is exclusive.
    pub fn shared(&self) -> bool {
        self.shared
    }

    /// Releases the lock.
    ///
    /// Returns `true` the first time it is called on a live lock and `false`
    /// on every later call. When the last live lock of the mutex goes away,
    /// the next waiter(s) in line are activated before this returns.
    ///
    /// # Example
    /// ```rust
    /// use interlock::sync::SharedMutex;
    ///
    /// let mutex = SharedMutex::new();
    /// let lock = mutex.acquire_exclusive_lock_immediate().unwrap();
    ///
    /// assert!(lock.release());
    /// assert!(!lock.release());
    /// ```
    pub fn release(&self) -> bool {
        let released = self.inner.release(self.lease);

        if released {
            trace!(shared = self.shared, "lock released");
        }

        released
    }
}

impl Drop for SharedLock {
    /// Releases the lock if it was not released explicitly.
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SharedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedLock")
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}
