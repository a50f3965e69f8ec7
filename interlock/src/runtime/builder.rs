use super::Runtime;

use std::env;
use std::io;
use std::thread;

use tracing::warn;

/// Environment variable overriding the default number of worker threads.
pub const WORKER_THREADS_ENV: &str = "INTERLOCK_WORKER_THREADS";

const DEFAULT_THREAD_NAME: &str = "interlock-worker";

/// Builder for configuring and creating a runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .worker_threads(4)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    /// Number of worker threads in the executor.
    worker_threads: usize,

    /// Prefix of the runtime's thread names.
    thread_name: String,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    ///
    /// The number of worker threads is read from `INTERLOCK_WORKER_THREADS`
    /// when it holds a positive integer. Otherwise it is the number of
    /// available logical CPUs, falling back to `1` if unavailable.
    pub fn new() -> Self {
        let worker_threads = worker_threads_from_env().unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });

        Self {
            worker_threads,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }

    /// Sets the number of worker threads used by the runtime.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets the name prefix of the runtime's threads.
    ///
    /// Workers are named `{name}-{index}` and the timer driver
    /// `{name}-timer`.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Builds the runtime with the configured options.
    ///
    /// This starts the timer driver and the worker threads.
    ///
    /// # Errors
    ///
    /// Returns an error if a thread cannot be spawned.
    pub fn build(self) -> io::Result<Runtime> {
        Runtime::new(self.worker_threads, &self.thread_name)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn worker_threads_from_env() -> Option<usize> {
    let value = env::var(WORKER_THREADS_ENV).ok()?;

    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(
                var = WORKER_THREADS_ENV,
                value = %value,
                "ignoring invalid worker thread count"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_settings_override_defaults() {
        let builder = RuntimeBuilder::new()
            .worker_threads(3)
            .thread_name("pool");

        assert_eq!(builder.worker_threads, 3);
        assert_eq!(builder.thread_name, "pool");
    }

    #[test]
    #[should_panic(expected = "worker_threads must be > 0")]
    fn zero_worker_threads_is_rejected() {
        let _ = RuntimeBuilder::new().worker_threads(0);
    }
}
