//! Telemetry helpers for structured logging and tracing.

/// Install a `RUST_LOG`-driven fmt subscriber unless one is already set.
///
/// Safe to call repeatedly, e.g. from every test.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_names(true)
        .try_init();
}
