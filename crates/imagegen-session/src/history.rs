//! Bounded, most-recent-first history of generated images.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Maximum number of retained generations.
pub const HISTORY_CAPACITY: usize = 10;

/// Key under which the history is persisted.
pub const HISTORY_KEY: &str = "imageHistory";

/// One past generation.
///
/// Items are immutable once created; the history only ever prepends new
/// items and evicts old ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// Unique identifier within the history.
    pub id: String,

    /// Reference to the generated image.
    #[serde(alias = "imageUrl")]
    pub image_ref: String,

    /// The prompt that produced the image.
    pub prompt: String,

    /// When the image was generated.
    pub created_at: DateTime<Utc>,
}

impl HistoryItem {
    /// Creates an item with a fresh id and the current timestamp.
    #[must_use]
    pub fn new(prompt: impl Into<String>, image_ref: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            image_ref: image_ref.into(),
            prompt: prompt.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ordered history, most recent first, never longer than
/// [`HISTORY_CAPACITY`] and never holding two items with the same id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    items: Vec<HistoryItem>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Builds a history from items in most-recent-first order.
    ///
    /// Later duplicates of an id are dropped and the result is truncated to
    /// [`HISTORY_CAPACITY`].
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = HistoryItem>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .take(HISTORY_CAPACITY)
            .collect();
        Self { items }
    }

    /// Prepends `item`, evicting the oldest entries beyond capacity.
    ///
    /// Returns the evicted items, oldest last.
    pub fn insert(&mut self, item: HistoryItem) -> Vec<HistoryItem> {
        self.items.retain(|existing| existing.id != item.id);
        self.items.insert(0, item);

        if self.items.len() > HISTORY_CAPACITY {
            self.items.split_off(HISTORY_CAPACITY)
        } else {
            Vec::new()
        }
    }

    /// Returns the item with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Returns the items, most recent first.
    #[must_use]
    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serializes the history for the durability collaborator.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a persisted history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PersistenceCorrupt` if `data` is not a JSON
    /// array of history items.
    pub fn decode(data: &str) -> Result<Self> {
        let items: Vec<HistoryItem> = serde_json::from_str(data)
            .map_err(|e| SessionError::persistence_corrupt(e.to_string()))?;
        Ok(Self::from_items(items))
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryItem;
    type IntoIter = std::slice::Iter<'a, HistoryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
