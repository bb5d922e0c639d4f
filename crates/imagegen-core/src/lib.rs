//! imagegen Core
//!
//! Shared wire contract, prompt validation, and configuration used by both
//! the generation gateway and the client-side session orchestrator.

pub mod config;
pub mod contract;
pub mod error;
pub mod suggestions;

pub use config::{ClientConfig, Config, ProviderConfig, ServerConfig};
pub use contract::{
    validate_prompt, ErrorResponse, GenerateImageRequest, GenerateImageResponse, PromptError,
    GENERATE_IMAGE_PATH, GENERIC_FAILURE_MESSAGE, HEALTH_PATH, MAX_PROMPT_CHARS,
};
pub use error::{ConfigError, Result};
pub use suggestions::PROMPT_SUGGESTIONS;
