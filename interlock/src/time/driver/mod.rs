//! Timer driver.
//!
//! A dedicated thread owns a min-heap of deadlines and wakes the tasks
//! parked on them. Sleep futures talk to it through [`Command`] messages.

mod command;
mod timer;

pub(crate) use command::Command;
pub(crate) use timer::TimerSlot;

use timer::TimerEntry;

use std::collections::BinaryHeap;
use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError, SendError, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::trace;

/// The timer driver, running on its own thread.
pub(crate) struct Driver {
    /// Channel receiving commands from runtime threads.
    receiver: Receiver<Command>,

    /// Min-heap of pending timers ordered by deadline.
    timers: BinaryHeap<TimerEntry>,
}

/// A handle used to communicate with the driver thread.
#[derive(Clone)]
pub(crate) struct DriverHandle {
    sender: Sender<Command>,
}

impl DriverHandle {
    /// Sends a command to the driver.
    pub(crate) fn send(&self, cmd: Command) -> Result<(), SendError<Command>> {
        self.sender.send(cmd)
    }
}

impl Driver {
    /// Starts the driver thread and returns a handle to it.
    pub(crate) fn start(name: String) -> io::Result<(DriverHandle, JoinHandle<()>)> {
        let (sender, receiver) = channel();

        let thread = thread::Builder::new().name(name).spawn(move || {
            Driver {
                receiver,
                timers: BinaryHeap::new(),
            }
            .run();
        })?;

        Ok((DriverHandle { sender }, thread))
    }

    /// Main driver loop.
    ///
    /// Blocks on the command channel until the next deadline, then fires
    /// every expired timer. Returns on `Shutdown` or once every handle has
    /// been dropped.
    fn run(&mut self) {
        loop {
            let next = match self.timers.peek() {
                Some(timer) => {
                    let wait = timer.deadline.saturating_duration_since(Instant::now());
                    self.receiver.recv_timeout(wait)
                }
                None => self
                    .receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match next {
                Ok(Command::SetTimer { deadline, slot }) => {
                    self.timers.push(TimerEntry { deadline, slot });
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                    trace!(pending = self.timers.len(), "timer driver stopped");
                    return;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            self.fire_expired();
        }
    }

    fn fire_expired(&mut self) {
        let now = Instant::now();

        while let Some(timer) = self.timers.peek() {
            if timer.deadline > now {
                break;
            }

            let Some(timer) = self.timers.pop() else {
                break;
            };

            if !timer.slot.is_cancelled() {
                timer.slot.fire();
            }
        }
    }
}
