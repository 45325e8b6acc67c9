//! Error types for the privileged channel.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the privileged executor.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No executor is connected.
    #[error("Privileged executor is unavailable")]
    Unavailable,

    /// The connection closed before a reply arrived.
    #[error("Connection to the privileged executor closed")]
    Closed,

    /// No reply arrived in time.
    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    /// The transport failed.
    #[error("Channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The executor replied with something that does not decode.
    #[error("Malformed response: {message}")]
    Malformed { message: String },

    /// A message could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChannelError {
    /// Whether this error means the round trip never completed, as opposed to
    /// a protocol fault in a reply that did arrive.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Unavailable | Self::Closed | Self::Timeout { .. } | Self::Io(_)
        )
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(ChannelError::Unavailable.is_transport());
        assert!(ChannelError::Closed.is_transport());
        assert!(
            ChannelError::Timeout {
                after: Duration::from_secs(1)
            }
            .is_transport()
        );
        assert!(ChannelError::Io(std::io::Error::other("broken pipe")).is_transport());
        assert!(
            !ChannelError::Malformed {
                message: "bad".into()
            }
            .is_transport()
        );
    }
}
