//! Cart persisted in a local storage slot.

use std::sync::Arc;

use bazaar_core::Cart;
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageError};

/// The local cart: a JSON array of lines in one storage slot.
///
/// Reads never fail: a missing, unreadable, or corrupt slot is an empty
/// cart. Writes replace the whole slot.
#[derive(Clone)]
pub struct LocalCartStore {
    storage: Arc<dyn KeyValueStore>,
    key: String,
}

impl LocalCartStore {
    /// Create a store over `key` in `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Slot name holding the cart.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored cart, treating missing or corrupt data as empty.
    #[must_use]
    pub fn read(&self) -> Cart {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Local cart unreadable, using empty cart");
                return Cart::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!(key = %self.key, error = %e, "Local cart corrupt, using empty cart");
            Cart::new()
        })
    }

    /// Replace the stored cart.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be written.
    pub fn write(&self, cart: &Cart) -> Result<(), StorageError> {
        let json = serde_json::to_string(cart).map_err(std::io::Error::other)?;
        self.storage.set(&self.key, &json)
    }

    /// Remove the stored cart entirely.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)
    }
}
