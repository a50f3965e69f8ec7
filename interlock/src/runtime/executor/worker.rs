use crate::runtime::context::{Handle, enter_context};

use tracing::trace;

/// A worker thread in the executor.
///
/// Workers share a single run queue and poll whatever task is at its
/// front. A woken task goes to the back, so every ready task gets its turn.
pub(crate) struct Worker {
    /// Index of the worker, for diagnostics.
    id: usize,

    /// Runtime this worker serves.
    handle: Handle,
}

impl Worker {
    pub(crate) fn new(id: usize, handle: Handle) -> Self {
        Self { id, handle }
    }

    /// Runs the worker loop until the run queue shuts down.
    ///
    /// The runtime context is installed for the whole lifetime of the
    /// thread, so tasks can spawn and sleep.
    pub(crate) fn run(self) {
        let Worker { id, handle } = self;
        let queue = handle.queue.clone();

        enter_context(handle, || {
            trace!(worker = id, "worker started");

            while let Some(task) = queue.next() {
                task.run();
            }

            trace!(worker = id, "worker stopped");
        });
    }
}
