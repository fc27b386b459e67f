//! Tracing initialization
//!
//! Installs a global subscriber: `RUST_LOG` (or the configured default filter)
//! plus a human-readable or JSON formatter.

use pixlift_core::{LogFormat, TelemetryConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Returns `false` if one was already set, so
/// repeated calls (for example from several tests) are harmless.
pub fn init_tracing(config: &TelemetryConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };

    match result {
        Ok(()) => {
            tracing::debug!(format = ?config.format, "Tracing initialized");
            true
        }
        Err(_) => false,
    }
}
