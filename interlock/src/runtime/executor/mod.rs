//! Task executor implementation.
//!
//! It is composed of:
//! - [`core`]: spawning and shutting down the worker pool,
//! - [`worker`]: the loop each worker thread runs.

pub(crate) mod core;
pub(crate) mod worker;
