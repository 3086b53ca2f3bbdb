use std::error::Error as StdError;

use thiserror::Error;
use tracing::error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TetherError>;

/// Failure taxonomy for detachment, reattachment, and storage adapters.
#[derive(Debug, Error)]
pub enum TetherError {
    /// A required input was missing or malformed. Nothing was constructed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Mutation attempted on a read-only referenced or detached instance, or a
    /// capability the adapter does not provide.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    /// The reattachment target could not be located in the searched scope.
    #[error("not found: {0}")]
    NotFound(String),
    /// A backing store failed. The original diagnostic and cause are preserved.
    #[error("backing store failure: {message}")]
    Backing {
        /// Original diagnostic text.
        message: String,
        /// Underlying cause.
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
}

impl TetherError {
    /// Shared signal for a required argument that was not supplied.
    pub fn argument_can_not_be_null(name: &str) -> Self {
        TetherError::InvalidArgument(format!("the provided argument can not be null: {name}"))
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        TetherError::NotFound(what.into())
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        TetherError::Unsupported(what.into())
    }

    /// Wraps any backing-store error, keeping its message and cause.
    pub fn backing<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let message = source.to_string();
        error!(%message, "backing store failure");
        TetherError::Backing {
            message,
            source: Box::new(source),
        }
    }

    /// True when reattachment failed because the target was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TetherError::NotFound(_))
    }

    /// True when a read-only instance or missing capability was misused.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, TetherError::Unsupported(_))
    }

    /// True for validation failures at construction.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, TetherError::InvalidArgument(_))
    }
}

impl From<rusqlite::Error> for TetherError {
    fn from(err: rusqlite::Error) -> Self {
        TetherError::backing(err)
    }
}

impl From<serde_json::Error> for TetherError {
    fn from(err: serde_json::Error) -> Self {
        TetherError::backing(err)
    }
}
