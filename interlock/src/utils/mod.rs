//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the crate.
//! In particular, it exposes a generational [`Slab`] used by the lock
//! bookkeeping to give every lease and every waiter a stable identity.

mod slab;

pub(crate) use slab::{Key, Slab};
