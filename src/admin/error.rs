use std::path::{Path, PathBuf};

use crate::types::StaticGraphError;
use thiserror::Error;

/// Error type for administrative operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No store directory at the specified path.
    #[error("store not found: {0}")]
    MissingStore(PathBuf),
    /// Custom error message.
    #[error("{0}")]
    Message(String),
    /// Core graph error.
    #[error(transparent)]
    Core(#[from] StaticGraphError),
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for administrative operations.
pub type Result<T> = std::result::Result<T, AdminError>;

impl AdminError {
    pub(crate) fn missing_store(path: impl AsRef<Path>) -> Self {
        AdminError::MissingStore(path.as_ref().to_path_buf())
    }
}
