use crate::error::JoinError;
use crate::runtime::context::{self, Handle};
use crate::runtime::executor::core::Executor;
use crate::runtime::queue::RunQueue;
use crate::runtime::task::{JoinHandle, spawn_on};
use crate::time::driver::{Command, Driver, DriverHandle};

use std::future::Future;
use std::io;
use std::panic;
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::thread::{self, Thread};

use tracing::debug;

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - spawning asynchronous tasks onto its worker threads,
/// - running the timer driver behind [`sleep`](crate::time::sleep) and
///   [`timeout`](crate::time::timeout),
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// Dropping the runtime shuts down all internal components in an orderly
/// fashion.
pub struct Runtime {
    /// Task executor responsible for scheduling and running futures.
    executor: Executor,

    /// Handle to the timer driver thread.
    timers: DriverHandle,

    /// The timer driver thread itself.
    driver: Option<thread::JoinHandle<()>>,
}

impl Runtime {
    /// Starts the timer driver and the worker threads.
    pub(crate) fn new(worker_threads: usize, thread_name: &str) -> io::Result<Self> {
        let (timers, driver) = Driver::start(format!("{thread_name}-timer"))?;

        let handle = Handle {
            queue: Arc::new(RunQueue::new()),
            timers: timers.clone(),
        };

        let executor = match Executor::new(handle, worker_threads, thread_name) {
            Ok(executor) => executor,
            Err(err) => {
                let _ = timers.send(Command::Shutdown);
                let _ = driver.join();
                return Err(err);
            }
        };

        debug!(worker_threads = executor.threads(), "runtime started");

        Ok(Self {
            executor,
            timers,
            driver: Some(driver),
        })
    }

    /// Spawns a future onto the runtime.
    ///
    /// The future runs on the worker threads; the returned [`JoinHandle`]
    /// resolves to its output.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(async { 42 });
    /// assert_eq!(runtime.block_on(handle).unwrap(), 42);
    /// ```
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        spawn_on(self.executor.queue(), future)
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// This method is typically used as the synchronous entry point
    /// of the runtime (e.g. in `main` or tests).
    ///
    /// The future is spawned onto the executor, and the current thread
    /// parks until it completes.
    ///
    /// # Panics
    ///
    /// - If the future panics, the panic is resumed on the current thread.
    /// - If called from one of the runtime's own worker threads.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        assert!(
            context::current_queue().is_none(),
            "cannot block_on from within a runtime thread"
        );

        let mut handle = pin!(self.spawn(future));

        let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
        let mut cx = Context::from_waker(&waker);

        loop {
            match handle.as_mut().poll(&mut cx) {
                Poll::Ready(Ok(output)) => return output,
                Poll::Ready(Err(JoinError::Panicked(payload))) => panic::resume_unwind(payload),
                Poll::Ready(Err(JoinError::Cancelled)) => {
                    panic!("block_on future was cancelled")
                }
                Poll::Pending => thread::park(),
            }
        }
    }
}

/// Unparks the thread blocked in [`Runtime::block_on`].
struct ThreadWaker(Thread);

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime.
    ///
    /// This performs the following steps:
    /// 1. Stops task submission and drops tasks still queued
    /// 2. Sends a shutdown command to the timer driver
    /// 3. Joins all worker threads and the driver thread
    fn drop(&mut self) {
        self.executor.shutdown();

        let _ = self.timers.send(Command::Shutdown);

        self.executor.join();

        if let Some(driver) = self.driver.take() {
            let _ = driver.join();
        }

        debug!("runtime stopped");
    }
}
