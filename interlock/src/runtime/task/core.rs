use super::JoinHandle;
use super::state::{CANCELLED, COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::error::{JoinError, panic_message};
use crate::runtime::context;
use crate::runtime::queue::RunQueue;
use crate::runtime::task::waker::make_waker;

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::task::{Context, Poll, Waker};

use tracing::{error, trace};

/// A runnable unit of work that can be executed by the scheduler.
///
/// The `Runnable` trait abstracts the specific return type of a task,
/// allowing the run queue to hold a heterogeneous collection of tasks
/// through `Arc<dyn Runnable>`.
pub(crate) trait Runnable: Send + Sync {
    /// Executes the task. This is called by a worker thread.
    fn run(self: Arc<Self>);
}

/// What a task currently holds.
enum Stage<T> {
    /// The future, not yet finished.
    Pending(Pin<Box<dyn Future<Output = T> + Send>>),

    /// The outcome, waiting for the `JoinHandle` to pick it up.
    Finished(Result<T, JoinError>),

    /// Neither: the future is being dropped, or the outcome has already
    /// been handed to the `JoinHandle`.
    Consumed,
}

/// A spawned asynchronous task managed by the runtime.
///
/// A `Task` owns a `Future` and coordinates its lifecycle: scheduling state,
/// polling, result storage and notification of the [`JoinHandle`].
pub(crate) struct Task<T> {
    /// The current lifecycle state of the task (IDLE, RUNNING, etc.).
    pub(crate) state: AtomicUsize,

    /// Future or outcome.
    ///
    /// Only the worker that moved the state to RUNNING polls the future,
    /// so the lock is uncontended except for a `JoinHandle` peeking.
    stage: Mutex<Stage<T>>,

    /// Run queue the task goes back to when woken.
    queue: Arc<RunQueue>,

    /// Waker of the `JoinHandle` awaiting this task.
    join_waker: Mutex<Option<Waker>>,
}

impl<T: Send + 'static> Task<T> {
    /// Creates a new task instance from a future.
    ///
    /// The task starts in the `QUEUED` state: the caller is expected to
    /// push it to the run queue right away.
    pub(crate) fn new<F>(future: F, queue: Arc<RunQueue>) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            state: AtomicUsize::new(QUEUED),
            stage: Mutex::new(Stage::Pending(Box::pin(future))),
            queue,
            join_waker: Mutex::new(None),
        }
    }

    /// Polls the task once.
    ///
    /// The task moves to `RUNNING`, its future is polled, and then:
    /// - `Poll::Pending`: back to `IDLE`, or re-queued if it was notified
    ///   meanwhile, or torn down if it was aborted meanwhile;
    /// - `Poll::Ready`: the output is stored and the `JoinHandle` woken;
    /// - panic: the payload is stored as a [`JoinError`] and the worker
    ///   carries on.
    pub(crate) fn run(self: Arc<Self>) {
        let current = self.state.load(Ordering::Acquire);

        if current != QUEUED && current != NOTIFIED {
            return;
        }

        if self
            .state
            .compare_exchange(current, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = make_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        let mut stage = self.lock_stage();

        let Stage::Pending(future) = &mut *stage else {
            return;
        };

        let poll = panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx)));

        match poll {
            Ok(Poll::Pending) => {
                drop(stage);
                self.park();
            }
            Ok(Poll::Ready(output)) => {
                self.publish(stage, Ok(output));
                self.complete();
            }
            Err(payload) => {
                error!(panic = panic_message(payload.as_ref()), "task panicked");

                self.publish(stage, Err(JoinError::Panicked(payload)));
                self.complete();
            }
        }
    }

    /// Settles the state after a poll returned `Pending`.
    ///
    /// `RUNNING` goes back to `IDLE`; a task notified during the poll is
    /// re-queued; a task aborted during the poll is torn down.
    fn park(self: Arc<Self>) {
        let mut current = RUNNING;

        loop {
            let next = match current {
                RUNNING => IDLE,
                NOTIFIED => QUEUED,
                CANCELLED => {
                    self.finish(Err(JoinError::Cancelled));
                    return;
                }
                _ => return,
            };

            match self
                .state
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    if next == QUEUED {
                        let queue = self.queue.clone();
                        queue.push(self);
                    }
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Signals the task to be rescheduled.
    ///
    /// If the task is `IDLE`, it moves to `QUEUED` and is pushed to the run
    /// queue. If it is `RUNNING`, it moves to `NOTIFIED` so it is polled again
    /// right after the current poll.
    pub(crate) fn schedule(self: Arc<Self>) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            match state {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        let queue = self.queue.clone();
                        queue.push(self);
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already queued, notified, or finished: nothing to do.
                _ => return,
            }
        }
    }

    /// Aborts the task.
    ///
    /// The future is dropped right away unless a worker is polling it, in
    /// which case the worker drops it once the poll returns. Either way the
    /// `JoinHandle` resolves to [`JoinError::Cancelled`].
    pub(crate) fn abort(&self) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            if state == COMPLETED || state == CANCELLED {
                return;
            }

            if self
                .state
                .compare_exchange(state, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                trace!("task aborted");

                // A task being polled is torn down by its worker.
                if state != RUNNING && state != NOTIFIED {
                    self.finish(Err(JoinError::Cancelled));
                }
                return;
            }
        }
    }

    /// Replaces a pending future with `outcome` and notifies the join handle.
    fn finish(&self, outcome: Result<T, JoinError>) {
        let stage = self.lock_stage();

        if !matches!(*stage, Stage::Pending(_)) {
            return;
        }

        self.publish(stage, outcome);
        self.notify_join();
    }

    /// Swaps the future for its outcome.
    ///
    /// The future is dropped, outside the lock, before the outcome becomes
    /// visible: whatever it held, such as a lock or a queued lock request,
    /// is gone by the time the `JoinHandle` resolves.
    fn publish(&self, mut stage: MutexGuard<'_, Stage<T>>, outcome: Result<T, JoinError>) {
        let future = std::mem::replace(&mut *stage, Stage::Consumed);
        drop(stage);

        // Destructors of the future may wake other tasks.
        drop(future);

        *self.lock_stage() = Stage::Finished(outcome);
    }

    fn complete(&self) {
        // An abort racing with the last poll loses: the output is kept.
        self.state.store(COMPLETED, Ordering::Release);
        self.notify_join();
    }

    fn notify_join(&self) {
        let waker = self
            .join_waker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Takes the outcome if the task has finished.
    ///
    /// Never blocks: a stage that is locked (task being polled) reads as
    /// unfinished, and the join waker is woken once it does finish.
    pub(crate) fn take_output(&self) -> Option<Result<T, JoinError>> {
        let mut stage = match self.stage.try_lock() {
            Ok(stage) => stage,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };

        match std::mem::replace(&mut *stage, Stage::Consumed) {
            Stage::Finished(outcome) => Some(outcome),
            other => {
                *stage = other;
                None
            }
        }
    }

    /// Registers the waker of the `JoinHandle`.
    pub(crate) fn register_join(&self, waker: &Waker) {
        let mut slot = self
            .join_waker
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match slot.as_ref() {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        let state = self.state.load(Ordering::Acquire);
        state == COMPLETED || state == CANCELLED
    }

    fn lock_stage(&self) -> MutexGuard<'_, Stage<T>> {
        self.stage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        Task::run(self)
    }
}

/// Spawns a future as a task onto the current runtime.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let handle = task::spawn(async { 1 + 1 });
/// assert_eq!(handle.await.unwrap(), 2);
/// ```
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let Some(queue) = context::current_queue() else {
        panic!("spawn must be called within the context of a runtime");
    };

    spawn_on(&queue, future)
}

/// Spawns a future onto the given run queue.
///
/// If the queue has shut down, the task is cancelled straight away.
pub(crate) fn spawn_on<F, T>(queue: &Arc<RunQueue>, future: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let task = Arc::new(Task::new(future, queue.clone()));

    if !queue.push(task.clone()) {
        task.abort();
    }

    JoinHandle { task }
}
