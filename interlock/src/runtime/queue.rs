use crate::runtime::task::Runnable;

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Tasks ready to be polled, plus the shutdown flag.
struct Tasks {
    ready: VecDeque<Arc<dyn Runnable>>,
    shutdown: bool,
}

/// Global run queue shared by all worker threads.
///
/// Spawned and woken tasks are pushed at the back and picked up from the
/// front. Idle workers block on a condition variable until a task shows up
/// or the runtime shuts down.
pub(crate) struct RunQueue {
    tasks: Mutex<Tasks>,
    condvar: Condvar,
}

impl RunQueue {
    /// Creates a new empty run queue.
    pub(crate) fn new() -> Self {
        Self {
            tasks: Mutex::new(Tasks {
                ready: VecDeque::new(),
                shutdown: false,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Pushes a task and wakes one idle worker.
    ///
    /// Returns `false` once the queue has shut down; the task is then
    /// dropped by the caller instead of being scheduled.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) -> bool {
        let mut tasks = self.lock();

        if tasks.shutdown {
            return false;
        }

        tasks.ready.push_back(task);
        drop(tasks);

        self.condvar.notify_one();
        true
    }

    /// Blocks until a task is available.
    ///
    /// Returns `None` once the queue has shut down.
    pub(crate) fn next(&self) -> Option<Arc<dyn Runnable>> {
        let mut tasks = self.lock();

        loop {
            if tasks.shutdown {
                return None;
            }

            if let Some(task) = tasks.ready.pop_front() {
                return Some(task);
            }

            tasks = self
                .condvar
                .wait(tasks)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Stops the queue and wakes every idle worker.
    ///
    /// The tasks still queued are handed back so the caller can drop them
    /// outside the lock: their destructors may wake other tasks.
    pub(crate) fn shutdown(&self) -> Vec<Arc<dyn Runnable>> {
        let mut tasks = self.lock();
        tasks.shutdown = true;
        let drained = tasks.ready.drain(..).collect();
        drop(tasks);

        self.condvar.notify_all();
        drained
    }

    fn lock(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl Runnable for Counter {
        fn run(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn tasks_come_out_in_push_order() {
        let queue = RunQueue::new();
        let first = Arc::new(Counter(AtomicUsize::new(0)));
        let second = Arc::new(Counter(AtomicUsize::new(10)));

        assert!(queue.push(first.clone()));
        assert!(queue.push(second.clone()));

        queue.next().unwrap().run();
        assert_eq!(first.0.load(Ordering::SeqCst), 1);
        assert_eq!(second.0.load(Ordering::SeqCst), 10);

        queue.next().unwrap().run();
        assert_eq!(second.0.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn shutdown_drains_and_rejects() {
        let queue = RunQueue::new();
        let task = Arc::new(Counter(AtomicUsize::new(0)));

        assert!(queue.push(task.clone()));
        assert_eq!(queue.shutdown().len(), 1);

        assert!(!queue.push(task));
        assert!(queue.next().is_none());
    }

    #[test]
    fn shutdown_releases_blocked_worker() {
        let queue = Arc::new(RunQueue::new());

        let worker = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.next().is_none())
        };

        std::thread::sleep(std::time::Duration::from_millis(20));
        queue.shutdown();

        assert!(worker.join().unwrap());
    }
}
