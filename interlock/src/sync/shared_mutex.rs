use super::lock::SharedLock;
use super::state::{Mode, State, WaitOutcome};
use crate::utils::Key;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as Mutex_std, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

use tracing::trace;

/// Bookkeeping shared between a mutex, its pending acquisitions and its
/// leased locks.
pub(crate) struct Inner {
    /// Mode, active set and wait queue, updated as one unit.
    ///
    /// Protected by a standard blocking `Mutex`: critical sections are short
    /// and never run user code.
    state: Mutex_std<State>,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: Mutex_std::new(State::new()),
        }
    }

    /// Locks the bookkeeping.
    ///
    /// No critical section can leave `State` half-updated, so a poisoned
    /// guard is still consistent and is recovered.
    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a lease and wakes whoever it unblocked.
    pub(crate) fn release(&self, lease: Key) -> bool {
        let mut wakers = Vec::new();
        let released = self.state().release(lease, &mut wakers);

        wake_all(wakers);
        released
    }

    /// Withdraws a waiter and wakes whoever its departure unblocked.
    fn cancel(&self, waiter: Key) {
        let mut wakers = Vec::new();
        self.state().cancel(waiter, &mut wakers);
        trace!(woken = wakers.len(), "lock request withdrawn");

        wake_all(wakers);
    }
}

/// Wakes activated waiters. Always called with the bookkeeping unlocked.
fn wake_all(wakers: Vec<Waker>) {
    for waker in wakers {
        waker.wake();
    }
}

/// A fair asynchronous readers/writer lock.
///
/// `SharedMutex` hands out [`SharedLock`]s: any number of shared locks may be
/// held together, while an exclusive lock excludes every other lock. The
/// mutex does not own the data it protects; callers agree to take the right
/// kind of lock before touching it.
///
/// Requests that cannot be granted immediately wait in a single FIFO queue.
/// When the mutex becomes free, an exclusive waiter at the head of the queue
/// is activated alone, while shared waiters at the head are activated
/// together with every shared waiter directly behind them. As soon as an
/// exclusive request has to wait, new shared requests queue up behind it
/// instead of joining the current readers, so neither side can starve the
/// other.
///
/// Cloning a `SharedMutex` yields another handle to the same lock.
///
/// # Example
/// ```rust
/// use interlock::sync::{Mode, SharedMutex};
///
/// let mutex = SharedMutex::new();
///
/// let r1 = mutex.acquire_shared_lock_immediate().unwrap();
/// let r2 = mutex.acquire_shared_lock_immediate().unwrap();
/// assert_eq!(mutex.mode(), Mode::Shared);
/// assert!(mutex.acquire_exclusive_lock_immediate().is_none());
///
/// drop((r1, r2));
/// assert!(mutex.acquire_exclusive_lock_immediate().is_some());
/// ```
#[derive(Clone)]
pub struct SharedMutex {
    inner: Arc<Inner>,
}

impl SharedMutex {
    /// Creates a new, free mutex with an empty wait queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new()),
        }
    }

    /// Attempts to take a shared lock without waiting.
    ///
    /// Succeeds while the mutex is [`Mode::Free`] or [`Mode::Shared`].
    /// Returns `None`, with no side effect, once an exclusive lock is held
    /// or queued.
    pub fn acquire_shared_lock_immediate(&self) -> Option<SharedLock> {
        let lease = self.inner.state().try_acquire_shared()?;
        trace!("shared lock granted immediately");

        Some(SharedLock::new(self.inner.clone(), lease, true))
    }

    /// Attempts to take an exclusive lock without waiting.
    ///
    /// Succeeds only while the mutex is [`Mode::Free`].
    pub fn acquire_exclusive_lock_immediate(&self) -> Option<SharedLock> {
        let lease = self.inner.state().try_acquire_exclusive()?;
        trace!("exclusive lock granted immediately");

        Some(SharedLock::new(self.inner.clone(), lease, false))
    }

    /// Requests a shared lock.
    ///
    /// The request is decided when this method is called: either the lock
    /// is granted on the spot, or the request joins the tail of the wait
    /// queue. The returned future resolves once the lock is held.
    ///
    /// Dropping the future before it resolves withdraws the request.
    pub fn acquire_shared_lock(&self) -> Acquire {
        self.acquire(true)
    }

    /// Requests an exclusive lock.
    ///
    /// If the lock cannot be granted on the spot, the mutex switches to
    /// [`Mode::Exclusive`] right away, so later shared requests queue behind
    /// this one rather than extending the current readers' turn.
    ///
    /// Dropping the future before it resolves withdraws the request.
    pub fn acquire_exclusive_lock(&self) -> Acquire {
        self.acquire(false)
    }

    fn acquire(&self, shared: bool) -> Acquire {
        let mut state = self.inner.state();

        let immediate = if shared {
            state.try_acquire_shared()
        } else {
            state.try_acquire_exclusive()
        };

        let stage = match immediate {
            Some(lease) => Stage::Ready(SharedLock::new(self.inner.clone(), lease, shared)),
            None => {
                let waiter = state.enqueue(shared);
                trace!(shared, waiting = state.waiting(), "lock request queued");
                Stage::Waiting(waiter)
            }
        };

        drop(state);

        Acquire {
            inner: self.inner.clone(),
            shared,
            stage,
        }
    }

    /// Runs `task` while holding a shared lock.
    ///
    /// The lock is requested when this method is called, held for as long
    /// as the task's future runs, and released when it completes, returns an
    /// error, or unwinds. The output is the task's own.
    ///
    /// # Example
    /// ```rust,ignore
    /// let len = mutex.run_shared(|| async { table.len() }).await;
    /// ```
    pub fn run_shared<F, Fut>(&self, task: F) -> impl Future<Output = Fut::Output> + use<F, Fut>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        run_locked(self.acquire_shared_lock(), task)
    }

    /// Runs `task` while holding an exclusive lock.
    ///
    /// See [`run_shared`](Self::run_shared) for the release guarantees.
    pub fn run_exclusive<F, Fut>(&self, task: F) -> impl Future<Output = Fut::Output> + use<F, Fut>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        run_locked(self.acquire_exclusive_lock(), task)
    }

    /// Returns the current admission mode.
    pub fn mode(&self) -> Mode {
        self.inner.state().mode()
    }

    /// Returns the number of locks currently held.
    pub fn active(&self) -> usize {
        self.inner.state().active()
    }

    /// Returns the number of requests waiting in the queue.
    pub fn waiting(&self) -> usize {
        self.inner.state().waiting()
    }
}

/// Awaits `acquire`, then runs `task` with the lock held.
///
/// The lock lives in a local binding, so it is dropped, and therefore
/// released, on every exit path including a panic inside the task.
async fn run_locked<F, Fut>(acquire: Acquire, task: F) -> Fut::Output
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    let lock = acquire.await;
    let output = task().await;

    lock.release();
    output
}

impl Default for SharedMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();

        f.debug_struct("SharedMutex")
            .field("mode", &state.mode())
            .field("active", &state.active())
            .field("waiting", &state.waiting())
            .finish()
    }
}

enum Stage {
    /// Granted at request time, not yet handed out.
    Ready(SharedLock),

    /// Queued under this waiter key.
    Waiting(Key),

    /// The lock has been handed out.
    Done,
}

/// Future returned by [`SharedMutex::acquire_shared_lock`] and
/// [`SharedMutex::acquire_exclusive_lock`].
///
/// The future resolves to a [`SharedLock`] once the request is activated.
/// It owns a handle to the mutex, so it can be moved into spawned tasks.
///
/// Dropping a pending `Acquire` removes its request from the queue without
/// disturbing the order of the others. If the request had already been
/// activated, the lock it was granted is released.
#[must_use = "a queued lock request does nothing unless awaited"]
pub struct Acquire {
    inner: Arc<Inner>,
    shared: bool,
    stage: Stage,
}

impl Acquire {
    /// Returns `true` if this requests a shared lock.
    pub fn shared(&self) -> bool {
        self.shared
    }
}

impl Future for Acquire {
    type Output = SharedLock;

    /// Polls the request.
    ///
    /// If the request has been activated the lock is returned. Otherwise the
    /// current task's waker is stored in the waiter slot, to be woken by the
    /// release that activates it.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match std::mem::replace(&mut this.stage, Stage::Done) {
            Stage::Ready(lock) => Poll::Ready(lock),
            Stage::Waiting(waiter) => {
                let outcome = this.inner.state().poll_waiter(waiter, cx.waker());

                match outcome {
                    WaitOutcome::Granted(lease) => {
                        trace!(shared = this.shared, "queued lock request granted");
                        Poll::Ready(SharedLock::new(this.inner.clone(), lease, this.shared))
                    }
                    WaitOutcome::Pending => {
                        this.stage = Stage::Waiting(waiter);
                        Poll::Pending
                    }
                }
            }
            Stage::Done => panic!("`Acquire` polled after completion"),
        }
    }
}

impl Drop for Acquire {
    /// Withdraws the request if it never handed out its lock.
    fn drop(&mut self) {
        if let Stage::Waiting(waiter) = self.stage {
            self.inner.cancel(waiter);
        }
    }
}

impl fmt::Debug for Acquire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            Stage::Ready(_) => "ready",
            Stage::Waiting(_) => "waiting",
            Stage::Done => "done",
        };

        f.debug_struct("Acquire")
            .field("shared", &self.shared)
            .field("stage", &stage)
            .finish()
    }
}
