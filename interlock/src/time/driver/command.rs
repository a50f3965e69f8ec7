use super::timer::TimerSlot;

use std::sync::Arc;
use std::time::Instant;

/// Messages accepted by the timer driver thread.
pub(crate) enum Command {
    /// Wake whoever is parked on `slot` once `deadline` is reached.
    SetTimer {
        deadline: Instant,
        slot: Arc<TimerSlot>,
    },

    /// Stop the driver thread. Pending timers are dropped unfired.
    Shutdown,
}
