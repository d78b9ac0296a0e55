//! Tracing subscriber setup for binaries embedding the crate.

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{Result, StaticGraphError};

/// Installs a global `fmt` subscriber filtered by `level`.
///
/// `level` accepts any `EnvFilter` directive, e.g. `info` or
/// `staticgraph::store=debug`. Fails if a subscriber is already installed.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| StaticGraphError::InvalidArgument(format!("Invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| StaticGraphError::InvalidArgument("Logging already initialized".into()))
}
