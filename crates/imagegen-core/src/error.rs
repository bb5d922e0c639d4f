//! Error types for loading imagegen configuration.

use std::path::PathBuf;

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating `imagegen.json`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your imagegen.json with a JSON linter")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// The configuration parsed but holds unusable values.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    Validation {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },
}

impl ConfigError {
    /// Creates a new `Parse` error with the given path and message.
    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Validation` error with the given message and suggestion.
    #[must_use]
    pub fn validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}
