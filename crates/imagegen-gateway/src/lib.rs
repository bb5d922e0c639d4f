//! imagegen Generation Gateway
//!
//! Stateless HTTP boundary that validates prompts, forwards them to a
//! text-to-image provider with a fixed profile, and normalizes the outcome
//! into `{ imageRef }` or `{ message }`.

pub mod api;
pub mod error;
pub mod mock;
pub mod profile;
pub mod provider;

pub use api::{create_router, generate_image, AppState, HealthResponse};
pub use error::{GatewayError, ProviderError, Result};
pub use mock::{MockProvider, MockResponse};
pub use profile::{GenerationProfile, ImageFormat, ProviderRequest, RANDOM_SEED};
pub use provider::{ImageProvider, OpenAiCompatibleProvider};
