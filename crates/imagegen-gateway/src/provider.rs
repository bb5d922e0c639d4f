//! Image provider abstraction and the OpenAI-compatible HTTP adapter.

use std::time::Duration;

use async_trait::async_trait;
use imagegen_core::ProviderConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::profile::ProviderRequest;

/// A text-to-image backend.
///
/// Implementations return the references of the generated images, in the
/// order the backend produced them.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates images for the given request.
    async fn generate(&self, request: &ProviderRequest) -> Result<Vec<String>, ProviderError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Provider speaking the OpenAI `images/generations` dialect, with the
/// extra body fields accepted by Nebius AI Studio.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    api_key_env: String,
    timeout: Duration,
}

impl OpenAiCompatibleProvider {
    /// Creates a provider for the API rooted at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/images/generations", base_url.trim_end_matches('/')),
            api_key,
            api_key_env: ProviderConfig::default().api_key_env,
            timeout,
        })
    }

    /// Creates a provider from configuration, reading the API key from the
    /// configured environment variable.
    ///
    /// A missing key is not an error here; each generation fails instead, so
    /// the gateway can still start and answer health checks.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!(env = %config.api_key_env, "Provider API key not set");
        }

        let mut provider = Self::new(&config.base_url, api_key, config.timeout())?;
        provider.api_key_env.clone_from(&config.api_key_env);
        Ok(provider)
    }

    /// The full URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageProvider for OpenAiCompatibleProvider {
    async fn generate(&self, request: &ProviderRequest) -> Result<Vec<String>, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::MissingApiKey {
                env: self.api_key_env.clone(),
            });
        };

        let body = ImagesRequest::from(request);
        debug!(endpoint = %self.endpoint, model = %body.model, "Calling image provider");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        parse_images_response(&text)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

impl OpenAiCompatibleProvider {
    fn classify(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            ProviderError::Request(err)
        }
    }
}

/// Request body for `POST /images/generations`.
#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    response_format: &'static str,
    response_extension: &'static str,
    width: u32,
    height: u32,
    num_inference_steps: u32,
    negative_prompt: &'a str,
    seed: i64,
}

impl<'a> From<&'a ProviderRequest> for ImagesRequest<'a> {
    fn from(request: &'a ProviderRequest) -> Self {
        Self {
            model: &request.model,
            prompt: &request.prompt,
            n: request.count,
            response_format: "url",
            response_extension: request.format.extension(),
            width: request.width,
            height: request.height,
            num_inference_steps: request.steps,
            negative_prompt: &request.negative_prompt,
            seed: request.seed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Extracts image URLs from a success body. Entries without a URL are skipped.
fn parse_images_response(body: &str) -> Result<Vec<String>, ProviderError> {
    let parsed: ImagesResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    Ok(parsed
        .data
        .into_iter()
        .filter_map(|image| image.url)
        .filter(|url| !url.trim().is_empty())
        .collect())
}

/// Pulls a human-readable message out of a provider error body.
///
/// Understands `{"error": {"message"}}`, `{"error": "..."}`, `{"detail"}`
/// and `{"message"}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let candidates = [
        value.pointer("/error/message"),
        value.get("error"),
        value.get("detail"),
        value.get("message"),
    ];

    let message = candidates
        .into_iter()
        .flatten()
        .filter_map(serde_json::Value::as_str)
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(ToString::to_string);
    message
}
