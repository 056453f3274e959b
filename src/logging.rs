//! # Structured Logging Module
//!
//! Environment-aware structured logging for tracing query compilation,
//! dynamic dispatch, and count-cache maintenance.

use std::env;
use std::sync::OnceLock;

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the global tracing subscriber once. Respects `RUST_LOG`;
/// `ARMATURE_LOG_JSON=1` switches the console layer to JSON output.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let json_output = env::var("ARMATURE_LOG_JSON").is_ok_and(|v| v == "1");

        let result = if json_output {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .json()
                        .with_filter(filter),
                )
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_filter(filter),
                )
                .try_init()
        };

        // a host application may have installed its own subscriber first
        if result.is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}
