//! Durable key-value storage
//!
//! The auth core persists its state through [`KeyValueStore`], a small
//! synchronous string-to-string map. Backends:
//! - [`MemoryStore`] for tests and throwaway sessions
//! - [`FileStore`] for a JSON file that survives restarts
//! - [`KeyringStore`] for the OS credential manager (via the keyring crate)

mod file;
mod keyring_store;
mod memory;

pub use file::FileStore;
pub use keyring_store::KeyringStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Keyring operation failed
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Backing file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file holds invalid data
    #[error("Invalid data format: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    /// A lock guarding the store was poisoned
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// String-keyed, string-valued persistence
///
/// All operations are synchronous. Writes are last-writer-wins; the store
/// does no coordination between callers.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value for `key`, or `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
