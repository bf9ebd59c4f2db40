//! Token store - the session's credentials in durable storage
//!
//! Access token, refresh token and serialized user info live under three
//! independent keys. Each mutation is written through immediately; reads
//! always go back to storage, so every holder of a `TokenStore` clone
//! sees the same state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use crate::config::StorageKeys;
use crate::security::Sanitizer;
use crate::storage::{KeyValueStore, StorageError};

/// Metadata about the signed-in account
///
/// Passed through untouched: fields the client does not know about are
/// kept in `extra` and written back as they came.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserInfo {
    /// Creates user info with a username
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    /// Sets the role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Sets the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A restored session
#[derive(Clone)]
pub struct Credentials {
    access_token: Zeroizing<String>,
    refresh_token: Option<Zeroizing<String>>,
    pub user: Option<UserInfo>,
}

impl Credentials {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().map(String::as_str)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &Sanitizer::sanitize_token(&self.access_token))
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("user", &self.user)
            .finish()
    }
}

/// Durable credential storage
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// The underlying key-value store
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Stores credentials
    ///
    /// The access token is always written. User info and the refresh token
    /// are only written when given (and non-empty), so a refresh can
    /// update the access token alone.
    pub fn set(
        &self,
        access_token: &str,
        user: Option<&UserInfo>,
        refresh_token: Option<&str>,
    ) -> Result<(), StorageError> {
        let refresh_token = refresh_token.filter(|t| !t.is_empty());

        tracing::info!(
            "Storing credentials: token {}, user {}, refresh token {}",
            Sanitizer::sanitize_token(access_token),
            user.and_then(|u| u.username.as_deref())
                .unwrap_or("(unchanged)"),
            if refresh_token.is_some() { "updated" } else { "unchanged" }
        );

        self.store.set(&self.keys.access_token, access_token)?;
        if let Some(user) = user {
            self.store
                .set(&self.keys.user_info, &serde_json::to_string(user)?)?;
        }
        if let Some(refresh_token) = refresh_token {
            self.store.set(&self.keys.refresh_token, refresh_token)?;
        }
        Ok(())
    }

    /// Restores the session from storage
    ///
    /// Returns `None` when the access token or the user info is missing.
    /// User info that does not parse is treated as a corrupted session:
    /// all three keys are cleared.
    pub fn get(&self) -> Option<Credentials> {
        let access_token = self.read(&self.keys.access_token)?;
        let user_raw = self.read(&self.keys.user_info)?;

        let user = match serde_json::from_str::<UserInfo>(&user_raw) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Stored user info is corrupted ({}); clearing session", e);
                if let Err(e) = self.clear() {
                    tracing::error!("Failed to clear corrupted session: {}", e);
                }
                return None;
            }
        };

        Some(Credentials {
            access_token: Zeroizing::new(access_token),
            refresh_token: self.read(&self.keys.refresh_token).map(Zeroizing::new),
            user: Some(user),
        })
    }

    /// Removes all three credential keys
    ///
    /// Every key is attempted; the first failure is returned.
    pub fn clear(&self) -> Result<(), StorageError> {
        tracing::info!("Clearing stored credentials");

        let mut first_error = None;
        for key in self.keys.auth_keys() {
            if let Err(e) = self.store.remove(key) {
                tracing::error!("Failed to remove {}: {}", key, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// True iff [`TokenStore::get`] would return credentials
    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// The stored access token, regardless of user info
    pub fn access_token(&self) -> Option<String> {
        self.read(&self.keys.access_token)
    }

    /// The stored refresh token
    pub fn refresh_token(&self) -> Option<String> {
        self.read(&self.keys.refresh_token)
    }

    /// Reads a non-empty value; storage failures read as absent
    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::error!("Failed to read {} from storage: {}", key, e);
                None
            }
        }
    }
}
