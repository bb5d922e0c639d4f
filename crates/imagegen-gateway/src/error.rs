//! Error types for the generation gateway.
//!
//! [`GatewayError`] is the stable failure contract exposed over HTTP.
//! [`ProviderError`] describes what went wrong talking to the provider and is
//! folded into a `GatewayError` before it leaves the gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imagegen_core::{ErrorResponse, PromptError, GENERIC_FAILURE_MESSAGE};

/// A specialized `Result` type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failures returned by the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request body or prompt was unusable. No provider call was made.
    #[error("{message}")]
    InvalidInput {
        /// Explanation for the caller.
        message: String,
    },

    /// The provider rejected the request or could not be reached.
    #[error("{message}")]
    GenerationFailed {
        /// Provider message when available, otherwise a generic one.
        message: String,
    },

    /// The provider reported success but returned nothing usable.
    #[error("Provider contract violation: {detail}")]
    ProviderContractViolation {
        /// Internal description; never sent to the caller.
        detail: String,
    },
}

impl GatewayError {
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

    /// Creates a new `ProviderContractViolation` error.
    #[must_use]
    pub fn contract_violation(detail: impl Into<String>) -> Self {
        Self::ProviderContractViolation {
            detail: detail.into(),
        }
    }

    /// Stable name of the failure class, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::ProviderContractViolation { .. } => "provider_contract_violation",
        }
    }

    /// HTTP status for this failure.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::GenerationFailed { .. } | Self::ProviderContractViolation { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show the caller.
    #[must_use]
    pub fn public_message(&self) -> &str {
        match self {
            Self::InvalidInput { message } | Self::GenerationFailed { message } => message,
            Self::ProviderContractViolation { .. } => GENERIC_FAILURE_MESSAGE,
        }
    }
}

impl From<PromptError> for GatewayError {
    fn from(err: PromptError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

impl From<ProviderError> for GatewayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MalformedResponse(detail) => Self::contract_violation(detail),
            ProviderError::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Self::generation_failed(message),
            ProviderError::Api { .. } => Self::generation_failed(GENERIC_FAILURE_MESSAGE),
            ProviderError::Request(e) => {
                // Transport errors carry the upstream URL; keep them out of responses
                tracing::warn!(error = %e, "Image provider request failed");
                Self::generation_failed(GENERIC_FAILURE_MESSAGE)
            }
            other => Self::generation_failed(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.public_message()));
        (self.status_code(), body).into_response()
    }
}

/// Failures talking to the image provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No API key was found in the configured environment variable.
    #[error("Missing provider API key: set the {env} environment variable")]
    MissingApiKey {
        /// Name of the environment variable that was checked.
        env: String,
    },

    /// The provider did not answer within the configured timeout.
    #[error("Image provider timed out after {timeout_secs}s")]
    Timeout {
        /// The timeout that elapsed.
        timeout_secs: u64,
    },

    /// The request could not be sent or the connection failed.
    #[error("Image provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with an error status.
    #[error("Image provider returned HTTP {status}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, if any.
        message: Option<String>,
    },

    /// The provider answered with a success status but an unreadable body.
    #[error("Image provider returned a malformed response: {0}")]
    MalformedResponse(String),
}
