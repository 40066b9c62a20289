//! Tracing subscriber installation for embedding applications and tests.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors returned by [`init_tracing`].
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The fallback filter directive does not parse.
    #[error("invalid log filter '{directive}': {reason}")]
    Filter {
        /// Directive that failed.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence; `default_filter` (for example
/// `"tenant_workflow=info"`) applies when it is unset.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when `default_filter` is malformed and
/// [`TelemetryError::AlreadyInstalled`] when another subscriber is already
/// the global default.
pub fn init_tracing(default_filter: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|err| TelemetryError::Filter {
            directive: default_filter.to_owned(),
            reason: err.to_string(),
        })?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInstalled(err.to_string()))
}
