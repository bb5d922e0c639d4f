//! Client side of the generation endpoint.

use async_trait::async_trait;
use imagegen_core::{
    ClientConfig, ErrorResponse, GenerateImageRequest, GenerateImageResponse, PromptError,
    GENERATE_IMAGE_PATH, GENERIC_FAILURE_MESSAGE,
};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::{Result, SessionError};

/// Successful outcome of a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Reference to the generated image.
    pub image_ref: String,
}

/// Something that turns a prompt into an image reference.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Requests one image for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<GenerationResult>;
}

/// Calls a running gateway over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGenerationClient {
    /// Creates a client for the gateway at `gateway_url`.
    #[must_use]
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}{GENERATE_IMAGE_PATH}",
                gateway_url.trim_end_matches('/')
            ),
        }
    }

    /// Creates a client from configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.gateway_url)
    }

    /// The full URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        debug!(endpoint = %self.endpoint, "Posting generation request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateImageRequest::new(prompt))
            .send()
            .await
            .map_err(|e| {
                SessionError::generation_failed(format!(
                    "Could not reach the image gateway: {e}"
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SessionError::generation_failed(format!("Could not read gateway response: {e}"))
        })?;

        interpret_response(status, &body)
    }
}

/// Maps a gateway reply to a generation result.
fn interpret_response(status: StatusCode, body: &str) -> Result<GenerationResult> {
    if status.is_success() {
        return match serde_json::from_str::<GenerateImageResponse>(body) {
            Ok(response) if !response.image_ref.trim().is_empty() => Ok(GenerationResult {
                image_ref: response.image_ref,
            }),
            _ => Err(SessionError::generation_failed(GENERIC_FAILURE_MESSAGE)),
        };
    }

    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|error| error.message)
        .filter(|message| !message.trim().is_empty());

    if status == StatusCode::BAD_REQUEST {
        Err(SessionError::invalid_input(
            message.unwrap_or_else(|| PromptError::Empty.to_string()),
        ))
    } else {
        Err(SessionError::generation_failed(
            message.unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
        ))
    }
}
