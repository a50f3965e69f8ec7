use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::Waker;
use std::time::Instant;

/// State shared between a [`Sleep`](crate::time::Sleep) future and the
/// driver.
///
/// The sleep keeps the waker current on every poll, so the task that
/// eventually gets woken is the one polling it last.
#[derive(Default)]
pub(crate) struct TimerSlot {
    waker: Mutex<Option<Waker>>,
    cancelled: AtomicBool,
}

impl TimerSlot {
    /// Stores the waker to notify when the timer fires.
    pub(crate) fn register(&self, waker: &Waker) {
        let mut slot = self.waker.lock().unwrap_or_else(PoisonError::into_inner);

        match slot.as_ref() {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    /// Marks the timer as abandoned: the driver discards it unfired.
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::Release);
        self.waker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::Acquire)
    }

    /// Wakes the registered task, if any.
    pub(crate) fn fire(&self) {
        let waker = self
            .waker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// An entry in the driver timer queue.
///
/// Stored in a `BinaryHeap` ordered by deadline.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Slot shared with the sleep future.
    pub(crate) slot: Arc<TimerSlot>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Reversed so that a `BinaryHeap<TimerEntry>` pops the earliest
    /// deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BinaryHeap;
    use std::time::Duration;

    #[test]
    fn heap_pops_earliest_deadline_first() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();

        for millis in [30, 10, 20] {
            heap.push(TimerEntry {
                deadline: now + Duration::from_millis(millis),
                slot: Arc::default(),
            });
        }

        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|entry| entry.deadline - now)
            .collect();

        assert_eq!(
            order,
            [10, 20, 30].map(Duration::from_millis).to_vec()
        );
    }

    #[test]
    fn cancelled_slot_forgets_waker() {
        let slot = TimerSlot::default();
        slot.register(Waker::noop());
        slot.cancel();

        assert!(slot.is_cancelled());
        assert!(slot.waker.lock().unwrap().is_none());
    }
}
