use crate::error::Elapsed;
use crate::time::sleep::{Sleep, sleep};

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Requires a future to complete within `duration`.
///
/// If the future completes first, its output is returned in `Ok`. Otherwise
/// the future is dropped and [`Elapsed`] is returned. Dropping a pending
/// lock request this way withdraws it from the lock's queue.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// match timeout(Duration::from_millis(50), mutex.acquire_lock()).await {
///     Ok(lock) => { /* ... */ }
///     Err(_) => { /* gave up waiting */ }
/// }
/// ```
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout {
        future: Some(Box::pin(future)),
        sleep: sleep(duration),
    }
}

/// Future returned by [`timeout`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Timeout<F> {
    /// The guarded future, dropped as soon as the race is decided.
    future: Option<Pin<Box<F>>>,
    sleep: Sleep,
}

impl<F> Future for Timeout<F>
where
    F: Future,
{
    type Output = Result<F::Output, Elapsed>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;

        let Some(future) = this.future.as_mut() else {
            panic!("`Timeout` polled after completion");
        };

        if let Poll::Ready(value) = future.as_mut().poll(cx) {
            this.future = None;
            return Poll::Ready(Ok(value));
        }

        if let Poll::Ready(()) = Pin::new(&mut this.sleep).poll(cx) {
            this.future = None;
            return Poll::Ready(Err(Elapsed(())));
        }

        Poll::Pending
    }
}

impl<F> fmt::Debug for Timeout<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeout")
            .field("sleep", &self.sleep)
            .finish_non_exhaustive()
    }
}
