//! Durable key-value slots for persisted session state.
//!
//! # Slots
//!
//! - `cart` - serialized array of cart lines, written after every cart mutation
//! - `products` - serialized catalog snapshot, written after every successful fetch
//!
//! Slots hold opaque strings; the owning component decides the encoding
//! (JSON via [`load_json`] / [`store_json`]). Stores are synchronous so a
//! mutation and its write happen in the same logical step.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from a slot store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("IO error on slot {slot}: {source}")]
    Io {
        slot: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized before writing.
    #[error("Serialization error on slot {slot}: {source}")]
    Serialize {
        slot: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Store lock was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// A named durable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Cart,
    Products,
}

impl Slot {
    /// Storage key for this slot.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Products => "products",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Process-local key-value storage.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait SlotStore: Send + Sync {
    /// Read a slot's raw value. Returns `None` if the slot is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError>;

    /// Replace a slot's raw value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn write(&self, slot: Slot, value: &str) -> Result<(), StorageError>;

    /// Erase a slot. Removing an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be modified.
    fn remove(&self, slot: Slot) -> Result<(), StorageError>;
}

/// Outcome of reading and decoding a slot.
#[derive(Debug)]
pub enum SlotRead<T> {
    /// Slot is absent.
    Missing,
    /// Slot decoded successfully.
    Loaded(T),
    /// Slot is present but does not decode.
    Corrupt(serde_json::Error),
}

/// Read and decode a JSON slot.
///
/// # Errors
///
/// Returns an error only if the store itself fails; undecodable content is
/// reported as [`SlotRead::Corrupt`].
pub fn load_json<T: DeserializeOwned>(
    store: &dyn SlotStore,
    slot: Slot,
) -> Result<SlotRead<T>, StorageError> {
    let Some(raw) = store.read(slot)? else {
        return Ok(SlotRead::Missing);
    };

    Ok(match serde_json::from_str(&raw) {
        Ok(value) => SlotRead::Loaded(value),
        Err(e) => SlotRead::Corrupt(e),
    })
}

/// Encode a value as JSON and write it to a slot.
///
/// # Errors
///
/// Returns an error if encoding or the write fails.
pub fn store_json<T: Serialize + ?Sized>(
    store: &dyn SlotStore,
    slot: Slot,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        slot: slot.key(),
        source,
    })?;
    store.write(slot, &raw)
}
