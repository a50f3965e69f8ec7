use crate::runtime::task::Task;

use std::sync::Arc;
use std::task::{Wake, Waker};

/// Waking a task reschedules it on the run queue it was spawned on.
impl<T: Send + 'static> Wake for Task<T> {
    fn wake(self: Arc<Self>) {
        self.schedule();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.clone().schedule();
    }
}

/// Creates a [`Waker`] associated with a runtime task.
///
/// The waker holds a strong reference to the task, so a task parked on a
/// lock or timer stays alive until it is woken or the waker is dropped.
pub(crate) fn make_waker<T: Send + 'static>(task: Arc<Task<T>>) -> Waker {
    Waker::from(task)
}
