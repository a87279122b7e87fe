//! Durable string-keyed storage slots.
//!
//! This is the client's equivalent of the browser's per-origin storage: a
//! flat map from slot names to string values. The cart, cached auth tokens,
//! and the user profile snapshot all live in slots.
//!
//! Two backends are provided:
//! - [`FileStore`] - one file per slot under a directory, written atomically
//! - [`MemoryStore`] - in-process map for tests and throwaway sessions

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Slot name contains characters the backend cannot store.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// A synchronous string-keyed store.
///
/// Writes replace the whole value of a slot; there is no partial update.
/// Implementations make no promise about concurrent writers beyond
/// last-writer-wins.
pub trait KeyValueStore: Send + Sync {
    /// Read a slot. Missing slots are `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace a slot's value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a slot. Deleting a missing slot succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be modified.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Check that a slot name is safe to use as a file name.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
