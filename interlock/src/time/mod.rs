//! Time utilities.
//!
//! This module provides timers that integrate with the runtime's timer
//! driver:
//! - [`sleep`] for waiting a given duration,
//! - [`timeout`] for bounding how long a future, such as a lock request,
//!   may take.

pub(crate) mod driver;

mod sleep;
mod timeout;

#[doc(inline)]
pub use sleep::{Sleep, sleep};

#[doc(inline)]
pub use timeout::{Timeout, timeout};
