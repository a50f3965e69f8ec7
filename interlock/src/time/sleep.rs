use crate::runtime::context;
use crate::time::driver::{Command, TimerSlot};

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
///
/// # Panics
///
/// The returned future panics if polled outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}

/// A future that completes once a specific deadline is reached.
///
/// The timer is registered with the runtime's timer driver on first poll.
///
/// This future is **cancel-safe**: dropping it withdraws the timer, so the
/// task is not woken for nothing.
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Whether the timer has already been handed to the driver.
    registered: bool,

    /// Waker slot shared with the driver.
    slot: Arc<TimerSlot>,
}

impl Sleep {
    pub(crate) fn new(duration: Duration) -> Self {
        let now = Instant::now();

        Self {
            // An unrepresentable deadline is as good as never.
            deadline: now
                .checked_add(duration)
                .unwrap_or(now + Duration::from_secs(86_400 * 365 * 30)),
            registered: false,
            slot: Arc::default(),
        }
    }

    /// The instant at which this sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        this.slot.register(cx.waker());

        if !this.registered {
            let Some(timers) = context::current_timers() else {
                panic!("Sleep polled outside of runtime");
            };

            this.registered = true;

            // A driver that is already gone means the runtime is shutting
            // down; the task will be dropped without being woken.
            let _ = timers.send(Command::SetTimer {
                deadline: this.deadline,
                slot: this.slot.clone(),
            });
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        self.slot.cancel();
    }
}

impl fmt::Debug for Sleep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sleep")
            .field("deadline", &self.deadline)
            .field("registered", &self.registered)
            .finish()
    }
}
