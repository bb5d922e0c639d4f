//! Error types for the session orchestrator.

use std::path::PathBuf;

use imagegen_core::PromptError;

/// A specialized `Result` type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Failures surfaced by the session orchestrator.
///
/// Only [`InvalidInput`](Self::InvalidInput) and
/// [`GenerationFailed`](Self::GenerationFailed) are meant for the user; the
/// rest are either prevented or recovered without user involvement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The prompt was rejected, locally or by the gateway.
    #[error("{message}")]
    InvalidInput {
        /// Explanation for the user.
        message: String,
    },

    /// The generation failed or timed out. Resubmitting may succeed.
    #[error("{message}")]
    GenerationFailed {
        /// Gateway message when available, otherwise a generic one.
        message: String,
    },

    /// A submission was attempted while another was still loading.
    #[error("An image is already being generated; wait for it to finish")]
    AlreadyInProgress,

    /// Persisted history could not be decoded.
    #[error("Stored history is unreadable: {message}")]
    PersistenceCorrupt {
        /// Description of the decode failure.
        message: String,
    },
}

impl SessionError {
    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new `GenerationFailed` error.
    #[must_use]
    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    /// Creates a new `PersistenceCorrupt` error.
    #[must_use]
    pub fn persistence_corrupt(message: impl Into<String>) -> Self {
        Self::PersistenceCorrupt {
            message: message.into(),
        }
    }

    /// Returns `true` if this error should be shown to the user.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::GenerationFailed { .. }
        )
    }
}

impl From<PromptError> for SessionError {
    fn from(err: PromptError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

/// Failures of the durability collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("History store I/O error at '{path}': {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The key contains characters that cannot be used as a file name.
    #[error("Invalid store key '{0}': use letters, digits, '-' or '_'")]
    InvalidKey(String),
}

impl StoreError {
    /// Creates a new `Io` error for `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
