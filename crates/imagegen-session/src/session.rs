//! Generation lifecycle for a single client session.
//!
//! The [`Orchestrator`] owns the session state machine, calls the gateway
//! through a [`GenerationClient`], and mirrors the history into a
//! [`HistoryStore`] after every successful generation.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use imagegen_core::{validate_prompt, ClientConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::GenerationClient;
use crate::error::{Result, SessionError};
use crate::history::{History, HistoryItem, HISTORY_KEY};
use crate::store::HistoryStore;

// ============================================================================
// Phase
// ============================================================================

/// Where the session is in its generation lifecycle.
///
/// Transitions:
/// - `Idle` -> `Loading` on the first accepted submission
/// - `Loading` -> `Ready` when the gateway returns an image
/// - `Loading` -> `Error` when the gateway fails or times out
/// - `Ready` / `Error` -> `Loading` on the next accepted submission
///
/// There is no terminal phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing has been generated yet.
    #[default]
    Idle,
    /// A generation is in flight.
    Loading,
    /// The last generation succeeded.
    Ready,
    /// The last generation failed.
    Error,
}

impl Phase {
    /// Returns `true` while a generation is in flight.
    ///
    /// # Examples
    ///
    /// ```
    /// use imagegen_session::Phase;
    ///
    /// assert!(Phase::Loading.is_loading());
    /// assert!(!Phase::Ready.is_loading());
    /// ```
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Everything a view needs to render the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Prompt of the image currently shown.
    pub current_prompt: String,

    /// Image currently shown, if any.
    pub current_image_ref: Option<String>,

    /// Lifecycle phase.
    pub phase: Phase,

    /// Past generations, most recent first.
    pub history: History,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives generations for one session.
///
/// At most one submission is in flight at a time. A second call to
/// [`submit`](Self::submit) while loading fails with
/// [`SessionError::AlreadyInProgress`] and changes nothing.
pub struct Orchestrator {
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn HistoryStore>,
    timeout: Duration,
    state: Mutex<SessionState>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("timeout", &self.timeout)
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator and loads any persisted history from `store`.
    ///
    /// Unreadable history is discarded with a warning; the session starts
    /// empty instead of failing.
    #[must_use]
    pub fn new(client: Arc<dyn GenerationClient>, store: Arc<dyn HistoryStore>) -> Self {
        let history = load_history(store.as_ref());
        debug!(items = history.len(), "Session initialized");

        Self {
            client,
            store,
            timeout: ClientConfig::default().timeout(),
            state: Mutex::new(SessionState {
                history,
                ..SessionState::default()
            }),
        }
    }

    /// Sets how long a generation may take before it counts as failed.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generates an image for `prompt` and records it in the history.
    ///
    /// The prompt is validated locally before any network call. On success
    /// the new item is returned and persisted; persistence failures are only
    /// logged.
    ///
    /// Dropping the returned future before it completes restores the phase
    /// that was current before the call.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidInput` if the prompt is rejected
    /// - `SessionError::AlreadyInProgress` if another submission is loading
    /// - `SessionError::GenerationFailed` if the gateway fails or times out
    pub async fn submit(&self, prompt: &str) -> Result<HistoryItem> {
        validate_prompt(prompt)?;

        let mut in_flight = self.begin()?;
        info!(prompt_len = prompt.chars().count(), "Submitting generation");

        let outcome = match tokio::time::timeout(self.timeout, self.client.generate(prompt)).await
        {
            Ok(result) => result,
            Err(_) => Err(SessionError::generation_failed(format!(
                "Image generation timed out after {}s",
                self.timeout.as_secs()
            ))),
        };
        in_flight.complete();

        match outcome {
            Ok(generated) => {
                let item = HistoryItem::new(prompt, generated.image_ref);
                let encoded = {
                    let mut state = self.lock();
                    state.phase = Phase::Ready;
                    state.current_prompt = prompt.to_string();
                    state.current_image_ref = Some(item.image_ref.clone());
                    let evicted = state.history.insert(item.clone());
                    if !evicted.is_empty() {
                        debug!(evicted = evicted.len(), "Evicted oldest history items");
                    }
                    state.history.encode()
                };

                info!(id = %item.id, image_ref = %item.image_ref, "Generation succeeded");
                match encoded {
                    Ok(data) => self.persist(data).await,
                    Err(e) => warn!(error = %e, "Failed to encode history"),
                }
                Ok(item)
            }
            Err(err) => {
                self.lock().phase = Phase::Error;
                warn!(error = %err, "Generation failed");
                Err(err)
            }
        }
    }

    /// Shows a past generation. No network call, no phase change, and the
    /// history order is untouched.
    pub fn select_from_history(&self, item: &HistoryItem) {
        let mut state = self.lock();
        state.current_prompt.clone_from(&item.prompt);
        state.current_image_ref = Some(item.image_ref.clone());
    }

    /// Looks up `id` in the history and selects it.
    ///
    /// Returns `None` if no item has that id.
    pub fn select_by_id(&self, id: &str) -> Option<HistoryItem> {
        let mut state = self.lock();
        let item = state.history.get(id)?.clone();
        state.current_prompt.clone_from(&item.prompt);
        state.current_image_ref = Some(item.image_ref.clone());
        Some(item)
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    /// Returns a copy of the history, most recent first.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryItem> {
        self.lock().history.items().to_vec()
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<InFlight<'_>> {
        let mut state = self.lock();
        if state.phase.is_loading() {
            return Err(SessionError::AlreadyInProgress);
        }

        let previous = state.phase;
        state.phase = Phase::Loading;
        Ok(InFlight {
            state: &self.state,
            previous,
            done: false,
        })
    }

    /// Writes the history on the blocking pool. Failures are logged only.
    async fn persist(&self, data: String) {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.set(HISTORY_KEY, &data)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to persist history"),
            Err(e) => warn!(error = %e, "History write task failed"),
        }
    }
}

fn load_history(store: &dyn HistoryStore) -> History {
    let data = match store.get(HISTORY_KEY) {
        Ok(Some(data)) => data,
        Ok(None) => return History::new(),
        Err(e) => {
            warn!(error = %e, "Could not read stored history, starting empty");
            return History::new();
        }
    };

    History::decode(&data).unwrap_or_else(|e| {
        warn!(error = %e, "Discarding stored history");
        History::new()
    })
}

/// Marks a submission as in flight. Restores the previous phase if dropped
/// before [`complete`](Self::complete) is called.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    previous: Phase,
    done: bool,
}

impl InFlight<'_> {
    fn complete(&mut self) {
        self.done = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.phase = self.previous;
            debug!(phase = %self.previous, "Submission cancelled");
        }
    }
}
