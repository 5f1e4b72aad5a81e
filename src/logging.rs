use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Installs the global subscriber: `info` by default, `RUST_LOG` overrides.
/// Logs go to stderr so tables on stdout stay clean.
pub fn init() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| AppError::ConfigError(format!("invalid log filter: {}", e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::ConfigError(format!("logging already initialized: {}", e)))
}
