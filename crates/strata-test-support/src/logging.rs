//! Test logging: routes `tracing` output through the test harness.

use tracing_subscriber::EnvFilter;

/// Installs a global subscriber that writes through the test harness's
/// captured output. Filter directives come from `RUST_LOG`, defaulting to
/// `warn`. Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
