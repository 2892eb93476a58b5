//! Structured logging setup.
//!
//! Logs go to stderr: hook handlers answer the host on stdout, and that
//! channel must stay clean JSON.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Env var holding the filter directive (falls back to `RUST_LOG`).
pub const LOG_ENV: &str = "MOAI_CHECKPOINT_LOG";
/// Set to `json` for machine-readable log lines.
pub const LOG_FORMAT_ENV: &str = "MOAI_CHECKPOINT_LOG_FORMAT";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber. Later calls keep the first one.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
