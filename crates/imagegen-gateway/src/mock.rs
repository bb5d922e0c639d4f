//! Scripted provider for tests and offline demos.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::profile::ProviderRequest;
use crate::provider::ImageProvider;

/// One scripted provider outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// Succeed with these image references.
    Images(Vec<String>),
    /// Fail with an HTTP error status and optional message.
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Message in the error body.
        message: Option<String>,
    },
    /// Succeed with an unreadable body.
    Malformed,
    /// Time out.
    Timeout,
}

impl MockResponse {
    fn into_result(self) -> Result<Vec<String>, ProviderError> {
        match self {
            Self::Images(images) => Ok(images),
            Self::ApiError { status, message } => Err(ProviderError::Api { status, message }),
            Self::Malformed => Err(ProviderError::MalformedResponse(
                "expected value at line 1 column 1".to_string(),
            )),
            Self::Timeout => Err(ProviderError::Timeout { timeout_secs: 0 }),
        }
    }
}

/// Provider that replays scripted responses and records every request.
///
/// Once the script is exhausted each call succeeds with a single
/// `mock://image/<n>.webp` reference, where `n` counts calls from 1.
#[derive(Debug, Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Creates a provider with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that replays `responses` in order.
    #[must_use]
    pub fn with_script(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Delays every response by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Appends a response to the script.
    pub fn push(&self, response: MockResponse) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of requests received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl ImageProvider for MockProvider {
    async fn generate(&self, request: &ProviderRequest) -> Result<Vec<String>, ProviderError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            calls.push(request.clone());
            calls.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        next.unwrap_or_else(|| {
            MockResponse::Images(vec![format!(
                "mock://image/{call_number}.{}",
                request.format
            )])
        })
        .into_result()
    }

    fn name(&self) -> &str {
        "mock"
    }
}
