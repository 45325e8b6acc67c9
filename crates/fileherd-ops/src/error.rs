//! Error types for orchestrated operations.
//!
//! Expected failures (unavailable executor, failed items, cancellation) are
//! reported through the caller's error sink. These errors cover the faults
//! with no safe local recovery.

use fileherd_channel::ChannelError;
use fileherd_core::{HistoryKind, ModelError};
use thiserror::Error;

/// Unexpected faults surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum OpsError {
    /// A request or configuration was invalid.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The executor replied with something that could not be understood.
    #[error("Privileged executor protocol error: {0}")]
    Protocol(#[from] ChannelError),

    /// The fallback engine failed outright.
    #[error("Fallback engine failed: {message}")]
    Fallback { message: String },

    /// The history record describes an action that cannot be reversed.
    #[error("{kind} cannot be undone")]
    Irreversible { kind: HistoryKind },
}

impl OpsError {
    /// Create a fallback engine error.
    pub fn fallback(message: impl Into<String>) -> Self {
        Self::Fallback {
            message: message.into(),
        }
    }
}

/// Result type for orchestrated operations.
pub type OpsResult<T> = Result<T, OpsError>;
