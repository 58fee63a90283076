//! Tracing subscriber setup for binaries and demos embedding the engine.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a global fmt subscriber, once per process.
///
/// Priority: explicit `level` > `RUST_LOG` > `NODEWRIGHT_LOG_LEVEL` > `"info"`.
/// Later calls are no-ops, and an already installed subscriber is left alone.
pub fn init_logging(level: Option<&str>) {
    let filter = level
        .map(str::to_string)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .or_else(|| std::env::var("NODEWRIGHT_LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .with_target(true)
            .try_init();
    });
}
