//! Tracing subscriber setup.
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RUST_LOG` | Filter directives, overrides `logging.level` | unset |
//! | `LOGGING__LEVEL` | Fallback filter directive | `info` |
//! | `LOGGING__JSON` | Emit JSON lines | `false` |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Result type for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Telemetry-specific error type
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

fn build_filter(config: &LoggingConfig) -> TelemetryResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|_| TelemetryError::InvalidFilter(config.level.clone())),
    }
}

/// Install the global tracing subscriber.
///
/// The host application calls this once at startup. A second call reports
/// `AlreadyInitialized` instead of panicking.
pub fn init_tracing(config: &LoggingConfig) -> TelemetryResult<()> {
    let env_filter = build_filter(config)?;

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    result.map_err(|_| TelemetryError::AlreadyInitialized)?;

    tracing::info!(level = %config.level, json = config.json, "Tracing initialized");
    Ok(())
}
