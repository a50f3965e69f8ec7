use crate::runtime::queue::RunQueue;
use crate::time::driver::DriverHandle;

use std::cell::RefCell;
use std::sync::Arc;

/// Handles to the runtime a thread is working for.
#[derive(Clone)]
pub(crate) struct Handle {
    /// Run queue new tasks are pushed to.
    pub(crate) queue: Arc<RunQueue>,

    /// Timer driver serving `sleep` and `timeout`.
    pub(crate) timers: DriverHandle,
}

thread_local! {
    /// Thread-local handle to the current runtime.
    ///
    /// Set on worker threads for their whole lifetime, and on the caller of
    /// `block_on` while it waits. Lets `spawn` and the timers reach the
    /// runtime without explicit parameter passing.
    static CURRENT: RefCell<Option<Handle>> = const { RefCell::new(None) };
}

/// Enters the runtime context for the duration of `f`.
///
/// The previous context is restored afterwards, so nested runtimes on the
/// same thread behave.
pub(crate) fn enter_context<R>(handle: Handle, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<Handle>);

    impl Drop for Restore {
        fn drop(&mut self) {
            let previous = self.0.take();
            CURRENT.with(|current| *current.borrow_mut() = previous);
        }
    }

    let previous = CURRENT.with(|current| current.replace(Some(handle)));
    let _restore = Restore(previous);

    f()
}

/// Run queue of the current runtime, if any.
pub(crate) fn current_queue() -> Option<Arc<RunQueue>> {
    CURRENT.with(|current| current.borrow().as_ref().map(|h| h.queue.clone()))
}

/// Timer driver of the current runtime, if any.
pub(crate) fn current_timers() -> Option<DriverHandle> {
    CURRENT.with(|current| current.borrow().as_ref().map(|h| h.timers.clone()))
}
