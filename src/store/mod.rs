//! Key/value persistence for onboarding progress.
//!
//! Provides a trait-based abstraction over the backing store to enable:
//! - Unit testing with an in-memory map
//! - On-disk persistence between runs
//! - Exercising failure paths (quota, unavailable) without a real disk

use thiserror::Error;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors specific to store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store is unavailable: {0}")]
    Unavailable(String),

    #[error("store quota exceeded writing '{key}' ({size} bytes, {limit} allowed)")]
    QuotaExceeded { key: String, size: usize, limit: usize },

    #[error("store I/O failed for '{0}': {1}")]
    Io(String, #[source] std::io::Error),
}

/// Synchronous string key/value store.
///
/// Keys are plain strings and values are JSON-encoded snapshots. The store is
/// assumed local and non-blocking, so no operation takes a timeout.
pub trait PersistenceStore: Send + Sync {
    /// Read the value stored under `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value stored under `key`; removing an absent key is a no-op
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
