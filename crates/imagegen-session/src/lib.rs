//! imagegen Session
//!
//! Client-side orchestration of image generations: the
//! idle/loading/ready/error lifecycle, a bounded most-recent-first history,
//! and persistence of that history through a key-value store.

pub mod client;
pub mod error;
pub mod history;
pub mod session;
pub mod store;

pub use client::{GenerationClient, GenerationResult, HttpGenerationClient};
pub use error::{Result, SessionError, StoreError};
pub use history::{History, HistoryItem, HISTORY_CAPACITY, HISTORY_KEY};
pub use session::{Orchestrator, Phase, SessionState};
pub use store::{FileStore, HistoryStore, MemoryStore};
