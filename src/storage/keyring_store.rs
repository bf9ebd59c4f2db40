//! OS credential manager store
//!
//! Stores each key as its own keyring entry under a service name
//! (Windows Credential Manager, macOS Keychain, Linux Secret Service).

use keyring::Entry;

use super::{KeyValueStore, StorageError};

/// A [`KeyValueStore`] backed by the platform keyring
///
/// # Example
///
/// ```no_run
/// use wavess_client::storage::{KeyValueStore, KeyringStore};
///
/// let store = KeyringStore::new();
/// store.set("adminToken", "my-token").unwrap();
/// assert_eq!(store.get("adminToken").unwrap(), Some("my-token".to_string()));
/// store.remove("adminToken").unwrap();
/// ```
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    /// Creates a store with the default service name
    pub fn new() -> Self {
        Self::with_service("wavess-client")
    }

    /// Creates a store with a custom service name
    ///
    /// Useful for separating sessions against different backends.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Returns the service name used for this store
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entry = Entry::new(&self.service, key)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Keyring(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let entry = Entry::new(&self.service, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let entry = Entry::new(&self.service, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::Keyring(e)),
        }
    }
}
