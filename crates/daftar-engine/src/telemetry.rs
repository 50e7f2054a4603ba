//! Tracing bootstrap for binaries and tests embedding the engine.

use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=daftar_engine=trace` - Trace the engine only
/// - Default: `info,daftar=debug,sqlx=warn`
///
/// Calling it again once a subscriber is installed does nothing.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,daftar=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
