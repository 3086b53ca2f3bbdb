use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, TetherError};

/// Installs the global `tracing` subscriber.
///
/// `level` is an `EnvFilter` directive such as `info` or `tether=debug`. Fails if
/// the directive does not parse or a subscriber is already installed.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| TetherError::InvalidArgument(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| TetherError::InvalidArgument("logging already initialized".into()))
}
