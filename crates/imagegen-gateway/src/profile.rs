//! The fixed technical profile applied to every generation.
//!
//! Callers only choose the prompt. Everything else is policy, changed by
//! shipping a new profile rather than by request options.

use serde::{Deserialize, Serialize};

/// Output encoding requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// WebP.
    Webp,
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
}

impl ImageFormat {
    /// Returns the file extension understood by the provider.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Seed value asking the provider to pick a random seed.
pub const RANDOM_SEED: i64 = -1;

/// Fixed generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationProfile {
    /// Provider model identifier.
    pub model: &'static str,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Number of inference steps.
    pub steps: u32,
    /// Negative prompt sent with every request.
    pub negative_prompt: &'static str,
    /// Seed; [`RANDOM_SEED`] lets the provider choose.
    pub seed: i64,
    /// Output encoding.
    pub format: ImageFormat,
    /// Number of images requested.
    pub count: u32,
}

impl GenerationProfile {
    /// The profile served by the gateway.
    pub const STANDARD: Self = Self {
        model: "black-forest-labs/flux-dev",
        width: 1024,
        height: 1024,
        steps: 28,
        negative_prompt: "",
        seed: RANDOM_SEED,
        format: ImageFormat::Webp,
        count: 1,
    };

    /// Builds the provider request for a validated prompt.
    #[must_use]
    pub fn request(&self, prompt: &str) -> ProviderRequest {
        ProviderRequest {
            model: self.model.to_string(),
            prompt: prompt.to_string(),
            width: self.width,
            height: self.height,
            steps: self.steps,
            negative_prompt: self.negative_prompt.to_string(),
            seed: self.seed,
            format: self.format,
            count: self.count,
        }
    }
}

impl Default for GenerationProfile {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Everything an [`ImageProvider`](crate::ImageProvider) needs for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequest {
    /// Provider model identifier.
    pub model: String,
    /// The validated prompt.
    pub prompt: String,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Number of inference steps.
    pub steps: u32,
    /// Negative prompt.
    pub negative_prompt: String,
    /// Seed; negative means random.
    pub seed: i64,
    /// Output encoding.
    pub format: ImageFormat,
    /// Number of images requested.
    pub count: u32,
}
