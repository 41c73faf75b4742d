//! Debounced, best-effort auto-save of wizard progress.
//!
//! Each `save` call returns immediately. The physical write happens on a
//! spawned task once the debounce window elapses without another `save` for
//! the same storage key. There is a single pending-write slot per key: arming a
//! new timer always aborts the previous one first.
//!
//! Aborting a task does not stop a write already running on another worker,
//! so writes and `clear` also go through a per-key generation gate. `clear`
//! bumps the generation while holding the gate; a write checks it under the
//! same lock and is dropped if it was armed before the clear.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::snapshot::{self, Snapshot, DEFAULT_KEY_PREFIX};
use crate::config::AutoSaveConfig;
use crate::store::{PersistenceStore, StoreError};

/// Default debounce window between the last edit and the write
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Outcome of a physical write, emitted after it happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoSaveEvent {
    /// Snapshot was written to the store
    Saved {
        key: String,
        step_index: usize,
        saved_at_epoch_ms: i64,
    },
    /// Write was attempted and skipped (serialization or store failure)
    Failed { key: String, reason: String },
}

/// Debounces snapshot writes to a [`PersistenceStore`].
///
/// Dropping the scheduler cancels every write still inside its debounce
/// window. A write that has already started always runs to completion.
pub struct AutoSaveScheduler {
    store: Arc<dyn PersistenceStore>,
    debounce: Duration,
    key_prefix: String,
    /// Pending timer per storage key
    pending: HashMap<String, JoinHandle<()>>,
    events: Option<mpsc::UnboundedSender<AutoSaveEvent>>,
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl AutoSaveScheduler {
    pub fn new(store: Arc<dyn PersistenceStore>, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            pending: HashMap::new(),
            events: None,
            generations: Arc::default(),
        }
    }

    /// Create a scheduler using the configured debounce window and key prefix
    pub fn from_config(store: Arc<dyn PersistenceStore>, config: &AutoSaveConfig) -> Self {
        Self::new(store, Duration::from_millis(config.debounce_ms))
            .with_key_prefix(config.key_prefix.clone())
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Send an [`AutoSaveEvent`] after every write attempt
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<AutoSaveEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Storage key a save or clear with these arguments would use
    pub fn key_for(&self, identity: Option<&str>, storage_key: Option<&str>) -> String {
        snapshot::storage_key(&self.key_prefix, storage_key, identity)
    }

    /// Schedule a write of `payload` at `step_index`, replacing any write still
    /// pending for the same key. Returns the storage key used.
    ///
    /// Outside a tokio runtime there is no timer to arm, so the write happens
    /// immediately.
    pub fn save<T>(
        &mut self,
        payload: T,
        step_index: usize,
        identity: Option<&str>,
        storage_key: Option<&str>,
    ) -> String
    where
        T: Serialize + Send + 'static,
    {
        let key = self.key_for(identity, storage_key);
        self.cancel_key(&key);
        self.pending.retain(|_, handle| !handle.is_finished());

        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let gate = Arc::clone(&self.generations);
        let generation = lock_gate(&gate).get(&key).copied().unwrap_or(0);

        match Handle::try_current() {
            Ok(runtime) => {
                let debounce = self.debounce;
                let task_key = key.clone();
                let handle = runtime.spawn(async move {
                    tokio::time::sleep(debounce).await;
                    write_snapshot(
                        store.as_ref(),
                        &task_key,
                        payload,
                        step_index,
                        events.as_ref(),
                        &gate,
                        generation,
                    );
                });
                self.pending.insert(key.clone(), handle);
            }
            Err(_) => {
                debug!(key = %key, "No async runtime; writing progress immediately");
                write_snapshot(
                    store.as_ref(),
                    &key,
                    payload,
                    step_index,
                    events.as_ref(),
                    &gate,
                    generation,
                );
            }
        }

        key
    }

    /// Whether a write for `key` is still waiting out its debounce window
    pub fn has_pending(&self, key: &str) -> bool {
        self.pending
            .get(key)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Cancel every pending write. Nothing is persisted for cancelled saves.
    pub fn cancel_pending(&mut self) {
        for (key, handle) in self.pending.drain() {
            if !handle.is_finished() {
                debug!(key = %key, "Cancelled pending auto-save");
            }
            handle.abort();
        }
    }

    /// Cancel any pending write for the key and delete the stored snapshot.
    ///
    /// Used once the wizard has been submitted. Store failures are logged and
    /// swallowed.
    pub fn clear(&mut self, identity: Option<&str>, storage_key: Option<&str>) -> String {
        let key = self.key_for(identity, storage_key);
        match self.clear_now(&key) {
            Ok(()) => debug!(key = %key, "Cleared onboarding progress"),
            Err(e) => warn!(key = %key, error = %e, "Failed to clear onboarding progress"),
        }
        key
    }

    /// Like [`clear`](Self::clear) for an already-derived key, but returns
    /// the store error instead of logging it.
    ///
    /// Any write armed before this call is discarded, including one that is
    /// already running: the removal waits for it to finish.
    pub fn clear_now(&mut self, key: &str) -> Result<(), StoreError> {
        self.cancel_key(key);
        let mut generations = lock_gate(&self.generations);
        *generations.entry(key.to_string()).or_insert(0) += 1;
        self.store.remove(key)
    }

    fn cancel_key(&mut self, key: &str) {
        if let Some(handle) = self.pending.remove(key) {
            handle.abort();
        }
    }
}

impl Drop for AutoSaveScheduler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn lock_gate(gate: &Mutex<HashMap<String, u64>>) -> MutexGuard<'_, HashMap<String, u64>> {
    // The map holds plain counters, so a poisoned lock is still consistent
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Serialize and write one snapshot. Never fails: errors are logged and
/// reported as [`AutoSaveEvent::Failed`]. A write whose generation was
/// superseded by `clear` is dropped without an event.
fn write_snapshot<T: Serialize>(
    store: &dyn PersistenceStore,
    key: &str,
    payload: T,
    step_index: usize,
    events: Option<&mpsc::UnboundedSender<AutoSaveEvent>>,
    gate: &Mutex<HashMap<String, u64>>,
    generation: u64,
) {
    let snapshot = Snapshot::now(payload, step_index);
    let result = serde_json::to_string(&snapshot)
        .map_err(|e| format!("serialization failed: {}", e))
        .and_then(|json| {
            let generations = lock_gate(gate);
            if generations.get(key).copied().unwrap_or(0) != generation {
                return Ok(false);
            }
            store.set(key, &json).map(|()| true).map_err(|e| e.to_string())
        });

    let event = match result {
        Ok(false) => {
            debug!(key = %key, "Progress cleared while saving; write dropped");
            return;
        }
        Ok(true) => {
            debug!(key = %key, step_index, "Saved onboarding progress");
            AutoSaveEvent::Saved {
                key: key.to_string(),
                step_index,
                saved_at_epoch_ms: snapshot.saved_at_epoch_ms,
            }
        }
        Err(reason) => {
            warn!(key = %key, error = %reason, "Auto-save failed; progress not persisted");
            AutoSaveEvent::Failed {
                key: key.to_string(),
                reason,
            }
        }
    };

    if let Some(tx) = events {
        // Receiver may already be gone during teardown
        let _ = tx.send(event);
    }
}
