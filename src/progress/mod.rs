//! Persistence of in-progress onboarding: debounced saves and staleness-checked
//! restores, both on top of a [`PersistenceStore`](crate::store::PersistenceStore).

pub mod autosave;
pub mod restore;
pub mod snapshot;

pub use autosave::{AutoSaveEvent, AutoSaveScheduler, DEFAULT_DEBOUNCE};
pub use restore::{ProgressRestorer, DEFAULT_TTL};
pub use snapshot::{now_epoch_ms, storage_key, Snapshot, DEFAULT_KEY_PREFIX};
