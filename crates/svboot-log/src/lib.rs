// ABOUTME: Shared logging setup for svboot binaries
// ABOUTME: Everything goes to stderr; stdout stays clean for the supervisor hand-off

use tracing_subscriber::EnvFilter;

/// Logging to stderr. Default: INFO level, RUST_LOG override.
/// Silently keeps an already-installed global subscriber.
pub fn init() {
    init_with_default(tracing::Level::INFO);
}

/// Logging to stderr with a caller-chosen default level, RUST_LOG override.
fn init_with_default(level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
