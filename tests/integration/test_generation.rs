//! End-to-end tests: a real gateway on a local port, driven over HTTP by the
//! session client and orchestrator.
//!
//! The provider behind the gateway is scripted, so no network access or API
//! key is needed.

use std::sync::Arc;
use std::time::Duration;

use imagegen_core::{GENERATE_IMAGE_PATH, GENERIC_FAILURE_MESSAGE, HEALTH_PATH};
use imagegen_gateway::{create_router, AppState, MockProvider, MockResponse};
use imagegen_session::{
    FileStore, GenerationClient, HttpGenerationClient, MemoryStore, Orchestrator, Phase,
    SessionError, HISTORY_CAPACITY,
};
use tempfile::TempDir;

/// A gateway running in the background for the duration of a test.
struct TestGateway {
    url: String,
    provider: Arc<MockProvider>,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawns the gateway on an ephemeral port.
async fn spawn_gateway(provider: MockProvider) -> TestGateway {
    let provider = Arc::new(provider);
    let router = create_router(AppState::new(provider.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    TestGateway {
        url: format!("http://{addr}"),
        provider,
        _handle: handle,
    }
}

fn image(url: &str) -> MockResponse {
    MockResponse::Images(vec![url.to_string()])
}

// ============================================================================
// Raw HTTP contract
// ============================================================================

/// Tests the success and failure bodies as seen by any HTTP client.
#[tokio::test]
async fn test_http_contract() {
    let gateway = spawn_gateway(MockProvider::with_script([
        image("https://x/img1.webp"),
        MockResponse::ApiError {
            status: 429,
            message: Some("Quota exceeded".to_string()),
        },
    ]))
    .await;
    let http = reqwest::Client::new();
    let endpoint = format!("{}{GENERATE_IMAGE_PATH}", gateway.url);

    let response = http
        .post(&endpoint)
        .json(&serde_json::json!({ "prompt": "a red fox in snow" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body, serde_json::json!({ "imageRef": "https://x/img1.webp" }));

    let response = http
        .post(&endpoint)
        .json(&serde_json::json!({ "prompt": "a lighthouse" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body, serde_json::json!({ "message": "Quota exceeded" }));

    let response = http
        .post(&endpoint)
        .json(&serde_json::json!({ "prompt": "   " }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(
        body,
        serde_json::json!({ "message": "Please provide a valid prompt" })
    );

    // A positional array is not an object even if it would fill the fields
    let response = http
        .post(&endpoint)
        .json(&serde_json::json!(["a red fox in snow"]))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 400);

    assert_eq!(gateway.provider.call_count(), 2);
}

/// Tests that the health endpoint is reachable.
#[tokio::test]
async fn test_health() {
    let gateway = spawn_gateway(MockProvider::new()).await;

    let response = reqwest::get(format!("{}{HEALTH_PATH}", gateway.url))
        .await
        .expect("Request failed");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["status"], "ok");
}

// ============================================================================
// HttpGenerationClient
// ============================================================================

/// Tests the client's mapping of each gateway outcome.
#[tokio::test]
async fn test_client_maps_gateway_outcomes() {
    let gateway = spawn_gateway(MockProvider::with_script([
        image("https://x/img1.webp"),
        MockResponse::ApiError {
            status: 401,
            message: Some("Invalid API key".to_string()),
        },
        MockResponse::ApiError {
            status: 500,
            message: None,
        },
        MockResponse::Images(vec![]),
        MockResponse::Malformed,
    ]))
    .await;
    let client = HttpGenerationClient::new(&gateway.url);

    let result = client.generate("a red fox in snow").await.expect("Generation failed");
    assert_eq!(result.image_ref, "https://x/img1.webp");

    let err = client.generate("a red fox").await.unwrap_err();
    assert_eq!(err, SessionError::generation_failed("Invalid API key"));

    let err = client.generate("a red fox").await.unwrap_err();
    assert_eq!(err, SessionError::generation_failed(GENERIC_FAILURE_MESSAGE));

    // Contract violations are reported without internal detail
    for _ in 0..2 {
        let err = client.generate("a red fox").await.unwrap_err();
        assert_eq!(err, SessionError::generation_failed(GENERIC_FAILURE_MESSAGE));
    }

    // Server-side validation is authoritative even when the client skips its own
    let err = client.generate("").await.unwrap_err();
    assert_eq!(err, SessionError::invalid_input("Please provide a valid prompt"));

    assert_eq!(gateway.provider.call_count(), 5);
}

/// Tests that the gateway applies the fixed generation profile.
#[tokio::test]
async fn test_gateway_forwards_fixed_profile() {
    let gateway = spawn_gateway(MockProvider::new()).await;
    let client = HttpGenerationClient::new(&gateway.url);

    client.generate("a red fox in snow").await.expect("Generation failed");

    let calls = gateway.provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "a red fox in snow");
    assert_eq!(calls[0].model, "black-forest-labs/flux-dev");
    assert_eq!((calls[0].width, calls[0].height), (1024, 1024));
    assert_eq!(calls[0].steps, 28);
    assert_eq!(calls[0].seed, -1);
}

// ============================================================================
// Orchestrator end to end
// ============================================================================

/// Tests a successful session round trip and history reload from disk.
#[tokio::test]
async fn test_session_persists_across_restart() {
    let gateway = spawn_gateway(MockProvider::with_script([
        image("https://x/img1.webp"),
        image("https://x/img2.webp"),
    ]))
    .await;
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(FileStore::new(temp_dir.path().join(".imagegen")));

    let session = Orchestrator::new(
        Arc::new(HttpGenerationClient::new(&gateway.url)),
        store.clone(),
    );
    let first = session.submit("a red fox in snow").await.expect("Submit failed");
    let second = session.submit("a lighthouse at dusk").await.expect("Submit failed");

    let state = session.snapshot();
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.current_image_ref.as_deref(), Some("https://x/img2.webp"));
    assert_eq!(state.history.items(), [second.clone(), first.clone()]);

    let restarted = Orchestrator::new(Arc::new(HttpGenerationClient::new(&gateway.url)), store);
    assert_eq!(restarted.history(), [second, first.clone()]);
    assert_eq!(restarted.phase(), Phase::Idle);

    let selected = restarted.select_by_id(&first.id).expect("Item not found");
    assert_eq!(selected.image_ref, "https://x/img1.webp");
    assert_eq!(restarted.snapshot().current_prompt, "a red fox in snow");
    assert_eq!(gateway.provider.call_count(), 2);
}

/// Tests that a gateway failure moves the session to error without losing
/// the previous image.
#[tokio::test]
async fn test_session_failure_keeps_previous_image() {
    let gateway = spawn_gateway(MockProvider::with_script([
        image("https://x/img1.webp"),
        MockResponse::ApiError {
            status: 400,
            message: Some("Prompt rejected by safety filter".to_string()),
        },
    ]))
    .await;
    let session = Orchestrator::new(
        Arc::new(HttpGenerationClient::new(&gateway.url)),
        Arc::new(MemoryStore::new()),
    );

    session.submit("a red fox in snow").await.expect("Submit failed");
    let err = session.submit("something else").await.unwrap_err();

    assert_eq!(
        err,
        SessionError::generation_failed("Prompt rejected by safety filter")
    );
    let state = session.snapshot();
    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.current_prompt, "a red fox in snow");
    assert_eq!(state.current_image_ref.as_deref(), Some("https://x/img1.webp"));
    assert_eq!(state.history.len(), 1);
}

/// Tests that an empty prompt never reaches the gateway.
#[tokio::test]
async fn test_session_rejects_empty_prompt_locally() {
    let gateway = spawn_gateway(MockProvider::new()).await;
    let session = Orchestrator::new(
        Arc::new(HttpGenerationClient::new(&gateway.url)),
        Arc::new(MemoryStore::new()),
    );

    let err = session.submit("").await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidInput { .. }));
    assert_eq!(gateway.provider.call_count(), 0);
    assert!(session.history().is_empty());
}

/// Tests that the client timeout turns a slow gateway into a failure.
#[tokio::test]
async fn test_session_timeout() {
    let gateway =
        spawn_gateway(MockProvider::new().with_delay(Duration::from_millis(500))).await;
    let session = Orchestrator::new(
        Arc::new(HttpGenerationClient::new(&gateway.url)),
        Arc::new(MemoryStore::new()),
    )
    .with_timeout(Duration::from_millis(50));

    let err = session.submit("a red fox").await.unwrap_err();

    assert!(matches!(err, SessionError::GenerationFailed { .. }));
    assert_eq!(session.phase(), Phase::Error);
    assert!(session.history().is_empty());
}

/// Tests the capacity bound over a longer session.
#[tokio::test]
async fn test_session_history_capacity() {
    let gateway = spawn_gateway(MockProvider::new()).await;
    let session = Orchestrator::new(
        Arc::new(HttpGenerationClient::new(&gateway.url)),
        Arc::new(MemoryStore::new()),
    );

    for n in 1..=HISTORY_CAPACITY + 2 {
        session
            .submit(&format!("prompt {n}"))
            .await
            .expect("Submit failed");
    }

    let history = session.history();
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert_eq!(history[0].prompt, format!("prompt {}", HISTORY_CAPACITY + 2));
    assert_eq!(history[HISTORY_CAPACITY - 1].prompt, "prompt 3");
    assert_eq!(history[0].image_ref, format!("mock://image/{}.webp", HISTORY_CAPACITY + 2));
}
