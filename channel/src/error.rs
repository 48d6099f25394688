//! Error types for the native messaging channel.
//!
//! The taxonomy follows the channel lifecycle: manifest resolution and
//! process spawn failures happen at connect time, protocol and I/O
//! failures end a live channel. Sending while disconnected is not an error
//! at all; it surfaces as [`crate::SendOutcome::Dropped`].

use std::path::PathBuf;

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Error types for channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// No host manifest was found for the configured host identifier.
    #[error("No native messaging host manifest found for '{host}' (searched {searched} directories)")]
    ManifestNotFound {
        /// Host identifier that could not be resolved
        host: String,
        /// Number of directories that were searched
        searched: usize,
    },

    /// A manifest file existed but was unusable.
    #[error("Invalid host manifest at {path}: {message}")]
    Manifest {
        /// Path of the offending manifest file
        path: PathBuf,
        /// What was wrong with it
        message: String,
    },

    /// The host executable could not be started.
    #[error("Failed to spawn native host '{host}': {source}")]
    Spawn {
        /// Host identifier being connected
        host: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// Wire-level errors (malformed frames, oversized messages, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// I/O errors on the channel pipes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChannelError {
    /// Create a protocol error.
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol(message.into())
    }

    /// Create an invalid-manifest error.
    pub fn manifest<S: Into<String>>(path: PathBuf, message: S) -> Self {
        Self::Manifest {
            path,
            message: message.into(),
        }
    }

    /// Get the error code for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ManifestNotFound { .. } => "MANIFEST_NOT_FOUND",
            Self::Manifest { .. } => "MANIFEST_INVALID",
            Self::Spawn { .. } => "SPAWN_FAILED",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Check if this error occurs while establishing a channel, as opposed
    /// to on a live one.
    pub fn is_connect_error(&self) -> bool {
        matches!(
            self,
            Self::ManifestNotFound { .. } | Self::Manifest { .. } | Self::Spawn { .. }
        )
    }
}
