//! Logging infrastructure.
//!
//! The engine itself only emits `tracing` events; hosts decide where they
//! go. [`init_tracing`] installs a reasonable global subscriber for
//! standalone use (CLI tools, batch scripts).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// Respects the `RUST_LOG` environment variable and falls back to the
/// provided default directive (e.g. `"info"` or `"ephys_core=debug"`).
/// Should be called once at application startup.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_installs_once() {
        init_test_tracing();
        init_test_tracing();
        tracing::warn!("subscriber reinstallation is a no-op");
    }
}
