//! UI preferences persisted next to the session

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::{KeyValueStore, StorageError};

/// Display preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: String,
    pub auto_scroll: bool,
    /// Anything else the application stores
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            auto_scroll: true,
            extra: Map::new(),
        }
    }
}

impl Preferences {
    /// Loads preferences stored under `key`, merged over the defaults
    ///
    /// Missing or unreadable preferences yield the defaults.
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Self {
        match store.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Stored preferences are invalid ({}); using defaults", e);
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::error!("Failed to read preferences: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
        store.set(key, &serde_json::to_string(self)?)
    }
}
