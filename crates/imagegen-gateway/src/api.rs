//! HTTP API for the generation gateway.
//!
//! # Endpoints
//!
//! - `POST /api/generate-image` - Generate one image from a prompt
//! - `GET /api/health` - Liveness check
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use imagegen_gateway::{create_router, AppState, MockProvider};
//!
//! # async fn example() {
//! let state = AppState::new(Arc::new(MockProvider::new()));
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use imagegen_core::{
    validate_prompt, GenerateImageRequest, GenerateImageResponse, GENERATE_IMAGE_PATH,
    HEALTH_PATH,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};

use crate::error::{GatewayError, Result};
use crate::profile::GenerationProfile;
use crate::provider::ImageProvider;

// ============================================================================
// Application State
// ============================================================================

/// Shared state for the gateway handlers.
///
/// The gateway keeps no per-request state; this only carries the provider
/// and the fixed generation profile.
#[derive(Clone)]
pub struct AppState {
    /// The image provider every request is forwarded to.
    pub provider: Arc<dyn ImageProvider>,
    /// Parameters applied to every generation.
    pub profile: GenerationProfile,
}

impl AppState {
    /// Creates state serving [`GenerationProfile::STANDARD`].
    #[must_use]
    pub fn new(provider: Arc<dyn ImageProvider>) -> Self {
        Self {
            provider,
            profile: GenerationProfile::STANDARD,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("provider", &self.provider.name())
            .field("profile", &self.profile)
            .finish()
    }
}

/// Response body for the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all gateway endpoints, permissive CORS and
/// request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(GENERATE_IMAGE_PATH, post(handle_generate_image))
        .route(HEALTH_PATH, get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Generation pipeline
// ============================================================================

/// Validates `prompt`, calls the provider once and returns the first image.
///
/// Invalid prompts fail before the provider is contacted. No retries are
/// attempted.
pub async fn generate_image(
    provider: &dyn ImageProvider,
    profile: &GenerationProfile,
    prompt: &str,
) -> Result<GenerateImageResponse> {
    validate_prompt(prompt)?;

    info!(
        provider = provider.name(),
        prompt_len = prompt.chars().count(),
        "Generating image"
    );

    let images = provider
        .generate(&profile.request(prompt))
        .await
        .map_err(GatewayError::from)?;

    let returned = images.len();
    let Some(image_ref) = images.into_iter().next() else {
        return Err(GatewayError::contract_violation(
            "provider reported success but returned no images",
        ));
    };

    if returned > 1 {
        debug!(returned, "Provider returned extra images; using the first");
    }
    info!(image_ref = %image_ref, "Image generated");

    Ok(GenerateImageResponse { image_ref })
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `POST /api/generate-image`.
///
/// Any body that does not deserialize to `{ "prompt": string }` is reported
/// as invalid input using the standard error body.
async fn handle_generate_image(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "Rejected request body");
        GatewayError::invalid_input("Please provide a valid prompt")
    })?;

    match generate_image(state.provider.as_ref(), &state.profile, &request.prompt).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            match &err {
                GatewayError::InvalidInput { message } => {
                    debug!(message = %message, "Invalid prompt");
                }
                GatewayError::GenerationFailed { message } => {
                    warn!(kind = err.kind(), message = %message, "Image generation failed");
                }
                GatewayError::ProviderContractViolation { detail } => {
                    error!(kind = err.kind(), detail = %detail, "Provider broke its contract");
                }
            }
            Err(err)
        }
    }
}

/// Handler for `GET /api/health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
