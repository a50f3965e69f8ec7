/// Task is idle and not scheduled.
///
/// The task is parked on some resource (a lock, a timer, another task) and
/// waits for its waker to fire.
pub(crate) const IDLE: usize = 0;

/// Task is queued for execution.
///
/// The task sits in the run queue, waiting for a worker.
pub(crate) const QUEUED: usize = 1;

/// Task is currently being polled by a worker.
///
/// At most one worker may observe this state at a time.
pub(crate) const RUNNING: usize = 2;

/// Task has finished: its future returned `Poll::Ready` or panicked.
pub(crate) const COMPLETED: usize = 3;

/// Task has been woken while running.
///
/// It is put back in the run queue as soon as the current poll returns.
pub(crate) const NOTIFIED: usize = 4;

/// Task has been aborted.
///
/// Its future is dropped without being polled again.
pub(crate) const CANCELLED: usize = 5;
