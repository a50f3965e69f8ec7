use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly `tracing` subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
