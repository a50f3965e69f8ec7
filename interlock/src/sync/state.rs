use crate::utils::{Key, Slab};

use std::collections::VecDeque;
use std::task::Waker;

use tracing::trace;

/// Admission mode of a [`SharedMutex`](super::SharedMutex).
///
/// The mode decides which kind of lock may be handed out *without waiting*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// No lock is held and nobody is waiting. Any lock may be granted.
    Free,

    /// At least one shared lock is held and no exclusive request is queued.
    /// Further shared locks may be granted immediately.
    Shared,

    /// An exclusive lock is held, or an exclusive request is queued behind
    /// the current shared holders. Nothing may be granted immediately.
    Exclusive,
}

/// A lock currently leased out.
struct Lease {
    shared: bool,
}

/// A queued acquisition request.
struct Waiter {
    shared: bool,
    status: WaitStatus,
}

enum WaitStatus {
    /// Still in the queue. Holds the waker of the last poll, if any.
    Queued(Option<Waker>),

    /// Activated; the lease was minted on the waiter's behalf and is waiting
    /// to be picked up by the next poll.
    Granted(Key),
}

/// Result of polling a waiter.
pub(crate) enum WaitOutcome {
    Granted(Key),
    Pending,
}

/// Bookkeeping shared by every handle of one mutex.
///
/// `State` is plain data: it is always accessed under the mutex's internal
/// guard, and none of its methods wake anything. Wakers of activated waiters
/// are pushed into the caller's buffer so they can be woken once the guard
/// has been dropped.
///
/// Invariants maintained by every method:
/// - an exclusive lease is never live together with any other lease;
/// - the queue is non-empty only while at least one lease is live;
/// - `mode == Free` exactly when there are no leases and no waiters;
/// - `mode == Exclusive` whenever an exclusive lease is live or any waiter is
///   queued.
pub(crate) struct State {
    mode: Mode,

    /// Leases currently handed out.
    leases: Slab<Lease>,

    /// Whether the single live lease is exclusive.
    exclusive_held: bool,

    /// Waiter slots, queued or granted-but-not-yet-observed.
    waiters: Slab<Waiter>,

    /// Queued waiters in arrival order.
    queue: VecDeque<Key>,
}

impl State {
    pub(crate) fn new() -> Self {
        Self {
            mode: Mode::Free,
            leases: Slab::with_capacity(4),
            exclusive_held: false,
            waiters: Slab::with_capacity(4),
            queue: VecDeque::new(),
        }
    }

    pub(crate) fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of leases currently handed out.
    pub(crate) fn active(&self) -> usize {
        self.leases.len()
    }

    /// Number of waiters still queued.
    pub(crate) fn waiting(&self) -> usize {
        self.queue.len()
    }

    /// Grants a shared lease if the mode allows it.
    pub(crate) fn try_acquire_shared(&mut self) -> Option<Key> {
        match self.mode {
            Mode::Free | Mode::Shared => {
                self.mode = Mode::Shared;
                Some(self.mint(true))
            }
            Mode::Exclusive => None,
        }
    }

    /// Grants an exclusive lease if the mutex is free.
    pub(crate) fn try_acquire_exclusive(&mut self) -> Option<Key> {
        match self.mode {
            Mode::Free => {
                self.mode = Mode::Exclusive;
                Some(self.mint(false))
            }
            Mode::Shared | Mode::Exclusive => None,
        }
    }

    /// Appends a waiter to the queue and returns its key.
    ///
    /// An exclusive waiter reserves `Exclusive` mode immediately, so shared
    /// requests arriving after it can no longer be granted ahead of it.
    pub(crate) fn enqueue(&mut self, shared: bool) -> Key {
        if !shared {
            self.mode = Mode::Exclusive;
        }

        let key = self.waiters.insert(Waiter {
            shared,
            status: WaitStatus::Queued(None),
        });
        self.queue.push_back(key);

        key
    }

    /// Checks whether a waiter has been activated.
    ///
    /// A granted waiter slot is consumed: the returned lease now belongs to
    /// the caller. A queued waiter records `waker` for its activation.
    pub(crate) fn poll_waiter(&mut self, waiter: Key, waker: &Waker) -> WaitOutcome {
        let Some(entry) = self.waiters.get_mut(waiter) else {
            return WaitOutcome::Pending;
        };

        match &mut entry.status {
            WaitStatus::Granted(lease) => {
                let lease = *lease;
                self.waiters.remove(waiter);
                WaitOutcome::Granted(lease)
            }
            WaitStatus::Queued(slot) => {
                match slot {
                    Some(existing) if existing.will_wake(waker) => {}
                    _ => *slot = Some(waker.clone()),
                }
                WaitOutcome::Pending
            }
        }
    }

    /// Withdraws a waiter whose acquisition future was dropped.
    ///
    /// A queued waiter is removed from the middle of the queue without
    /// reordering the others, after which the queue is dispatched again since
    /// its head may have changed. A waiter that was already granted gives its
    /// lease back.
    pub(crate) fn cancel(&mut self, waiter: Key, wakers: &mut Vec<Waker>) {
        let Some(entry) = self.waiters.remove(waiter) else {
            return;
        };

        match entry.status {
            WaitStatus::Queued(_) => {
                self.queue.retain(|&key| key != waiter);
                trace!(shared = entry.shared, "queued waiter cancelled");
                self.dispatch(wakers);
            }
            WaitStatus::Granted(lease) => {
                trace!(shared = entry.shared, "granted waiter cancelled");
                self.release(lease, wakers);
            }
        }
    }

    /// Returns a lease.
    ///
    /// Returns `false` if the lease is no longer live. Releasing the last
    /// live lease resets the mode and activates the next waiter(s).
    pub(crate) fn release(&mut self, lease: Key, wakers: &mut Vec<Waker>) -> bool {
        let Some(removed) = self.leases.remove(lease) else {
            return false;
        };

        if !removed.shared {
            self.exclusive_held = false;
        }

        if self.leases.is_empty() {
            self.mode = Mode::Free;
            self.dispatch(wakers);
        }

        true
    }

    fn mint(&mut self, shared: bool) -> Key {
        if !shared {
            self.exclusive_held = true;
        }

        self.leases.insert(Lease { shared })
    }

    /// Activates every waiter that is compatible with the live leases,
    /// in queue order, then recomputes the mode.
    fn dispatch(&mut self, wakers: &mut Vec<Waker>) {
        if self.exclusive_held {
            self.mode = Mode::Exclusive;
            return;
        }

        if self.leases.is_empty() {
            if let Some(&head) = self.queue.front() {
                if self.waiter_is_exclusive(head) {
                    self.queue.pop_front();
                    self.activate(head, wakers);
                    self.mode = Mode::Exclusive;
                    return;
                }
            }
        }

        // Shared waiters at the head run alongside whatever shared leases
        // are live; stop at the first exclusive one.
        while let Some(&head) = self.queue.front() {
            if self.waiter_is_exclusive(head) {
                break;
            }

            self.queue.pop_front();
            self.activate(head, wakers);
        }

        self.mode = if !self.queue.is_empty() {
            Mode::Exclusive
        } else if self.leases.is_empty() {
            Mode::Free
        } else {
            Mode::Shared
        };
    }

    fn waiter_is_exclusive(&self, waiter: Key) -> bool {
        self.waiters
            .get(waiter)
            .is_some_and(|waiter| !waiter.shared)
    }

    fn activate(&mut self, waiter: Key, wakers: &mut Vec<Waker>) {
        let Some(shared) = self.waiters.get(waiter).map(|waiter| waiter.shared) else {
            return;
        };

        let lease = self.mint(shared);

        if let Some(entry) = self.waiters.get_mut(waiter) {
            let previous = std::mem::replace(&mut entry.status, WaitStatus::Granted(lease));

            if let WaitStatus::Queued(Some(waker)) = previous {
                wakers.push(waker);
            }
        }

        trace!(shared, "waiter activated");
    }
}
