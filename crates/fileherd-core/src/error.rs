//! Error types for the data model.

use std::path::PathBuf;

use thiserror::Error;

use crate::request::OperationKind;

/// Errors raised while building requests or loading configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A request was built without any items.
    #[error("{kind} request has no items")]
    EmptyRequest { kind: OperationKind },

    /// A non-delete request item has no destination.
    #[error("{kind} request item {path} has no destination")]
    MissingDestination { kind: OperationKind, path: PathBuf },

    /// A new name failed validation.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Configuration file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModelError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
