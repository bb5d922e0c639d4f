//! Wire contract between the session orchestrator and the generation gateway.
//!
//! Both sides validate prompts with [`validate_prompt`]: the client to give
//! immediate feedback, the gateway as the authoritative check.

use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Route of the generation endpoint.
pub const GENERATE_IMAGE_PATH: &str = "/api/generate-image";

/// Route of the liveness endpoint.
pub const HEALTH_PATH: &str = "/api/health";

/// Maximum prompt length, counted in characters.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Message used when a generation fails without a usable explanation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate image";

/// Request body for `POST /api/generate-image`.
///
/// Only a JSON object is accepted; the positional sequence form serde
/// derives for structs is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateImageRequest {
    /// Natural-language description of the image.
    pub prompt: String,
}

impl GenerateImageRequest {
    /// Creates a request for the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl<'de> Deserialize<'de> for GenerateImageRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RequestVisitor)
    }
}

struct RequestVisitor;

impl<'de> Visitor<'de> for RequestVisitor {
    type Value = GenerateImageRequest;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with a string `prompt` field")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut prompt: Option<String> = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == "prompt" {
                if prompt.is_some() {
                    return Err(de::Error::duplicate_field("prompt"));
                }
                prompt = Some(map.next_value()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }

        let prompt = prompt.ok_or_else(|| de::Error::missing_field("prompt"))?;
        Ok(GenerateImageRequest { prompt })
    }
}

/// Success body for `POST /api/generate-image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    /// Displayable reference (usually a URL) to the generated image.
    pub image_ref: String,
}

/// Failure body returned with any non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable description of the failure.
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error body with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reasons a prompt is rejected before any generation is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    /// Prompt is empty or whitespace only.
    #[error("Please provide a valid prompt")]
    Empty,

    /// Prompt exceeds [`MAX_PROMPT_CHARS`].
    #[error("Prompt is too long (max {max} characters, got {actual})")]
    TooLong {
        /// The configured maximum.
        max: usize,
        /// The length of the rejected prompt.
        actual: usize,
    },
}

/// Checks that a prompt is non-blank and at most [`MAX_PROMPT_CHARS`] long.
///
/// The length check applies to the prompt as submitted, not the trimmed form.
///
/// # Examples
///
/// ```
/// use imagegen_core::{validate_prompt, PromptError};
///
/// assert!(validate_prompt("a red fox in snow").is_ok());
/// assert_eq!(validate_prompt("   "), Err(PromptError::Empty));
/// ```
pub fn validate_prompt(prompt: &str) -> Result<(), PromptError> {
    if prompt.trim().is_empty() {
        return Err(PromptError::Empty);
    }

    let actual = prompt.chars().count();
    if actual > MAX_PROMPT_CHARS {
        return Err(PromptError::TooLong {
            max: MAX_PROMPT_CHARS,
            actual,
        });
    }

    Ok(())
}
