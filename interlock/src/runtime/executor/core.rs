use crate::runtime::context::Handle;
use crate::runtime::executor::worker::Worker;
use crate::runtime::queue::RunQueue;

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Multi-threaded task executor.
///
/// The `Executor` owns the worker threads and the run queue they share.
pub(crate) struct Executor {
    /// Run queue shared by all workers.
    queue: Arc<RunQueue>,

    /// Join handles for worker threads.
    handles: Vec<JoinHandle<()>>,
}

impl Executor {
    /// Spawns `threads` named worker threads serving `handle`.
    ///
    /// If a thread fails to spawn, the ones already running are shut down
    /// and the error is returned.
    pub(crate) fn new(handle: Handle, threads: usize, name: &str) -> io::Result<Self> {
        let mut executor = Self {
            queue: handle.queue.clone(),
            handles: Vec::with_capacity(threads),
        };

        for id in 0..threads {
            let worker = Worker::new(id, handle.clone());

            let spawned = thread::Builder::new()
                .name(format!("{name}-{id}"))
                .spawn(move || worker.run());

            match spawned {
                Ok(thread) => executor.handles.push(thread),
                Err(err) => {
                    executor.shutdown();
                    executor.join();
                    return Err(err);
                }
            }
        }

        Ok(executor)
    }

    /// Shared run queue of the workers.
    pub(crate) fn queue(&self) -> &Arc<RunQueue> {
        &self.queue
    }

    /// Signals all workers to shut down.
    ///
    /// Tasks still waiting in the queue are dropped, outside of the queue
    /// lock.
    pub(crate) fn shutdown(&self) {
        let pending = self.queue.shutdown();
        drop(pending);
    }

    /// Waits for all worker threads to terminate.
    ///
    /// This should be called after initiating shutdown.
    pub(crate) fn join(&mut self) {
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
    }

    pub(crate) fn threads(&self) -> usize {
        self.handles.len()
    }
}
