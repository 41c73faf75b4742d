//! Reads persisted wizard progress back, discarding anything stale.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::snapshot::{self, now_epoch_ms, Snapshot, DEFAULT_KEY_PREFIX};
use crate::config::AutoSaveConfig;
use crate::store::PersistenceStore;

/// Snapshots older than this are treated as absent and purged
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Loads a [`Snapshot`] for a wizard mount.
///
/// Every failure (missing, unreadable, corrupt, stale) degrades to `None` so
/// the wizard simply starts fresh.
pub struct ProgressRestorer {
    store: Arc<dyn PersistenceStore>,
    ttl: Duration,
    key_prefix: String,
}

impl ProgressRestorer {
    pub fn new(store: Arc<dyn PersistenceStore>) -> Self {
        Self {
            store,
            ttl: DEFAULT_TTL,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn from_config(store: Arc<dyn PersistenceStore>, config: &AutoSaveConfig) -> Self {
        Self::new(store)
            .with_ttl(Duration::from_secs(config.ttl_days.saturating_mul(24 * 60 * 60)))
            .with_key_prefix(config.key_prefix.clone())
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Restore the snapshot for `identity` / `storage_key` as of now
    pub fn restore<T: DeserializeOwned>(
        &self,
        identity: Option<&str>,
        storage_key: Option<&str>,
    ) -> Option<Snapshot<T>> {
        self.restore_at(identity, storage_key, now_epoch_ms())
    }

    /// Restore as of `now_ms`. A snapshot older than the TTL is removed from
    /// the store and never returned; one exactly at the TTL is still fresh.
    pub fn restore_at<T: DeserializeOwned>(
        &self,
        identity: Option<&str>,
        storage_key: Option<&str>,
        now_ms: i64,
    ) -> Option<Snapshot<T>> {
        let key = snapshot::storage_key(&self.key_prefix, storage_key, identity);

        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read onboarding progress; starting fresh");
                return None;
            }
        };

        let snapshot: Snapshot<T> = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(key = %key, error = %e, "Ignoring unparseable onboarding progress");
                return None;
            }
        };

        let age_ms = snapshot.age_ms(now_ms);
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if age_ms > ttl_ms {
            info!(key = %key, age_ms, "Discarding stale onboarding progress");
            if let Err(e) = self.store.remove(&key) {
                warn!(key = %key, error = %e, "Failed to remove stale onboarding progress");
            }
            return None;
        }

        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::{json, Value};

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    const NOW: i64 = 1_760_000_000_000;

    fn put(store: &MemoryStore, key: &str, saved_at: i64) {
        let snapshot = Snapshot {
            payload: json!({"firstName": "Grace"}),
            step_index: 3,
            saved_at_epoch_ms: saved_at,
        };
        store
            .set(key, &serde_json::to_string(&snapshot).unwrap())
            .unwrap();
    }

    fn restorer(store: &MemoryStore) -> ProgressRestorer {
        ProgressRestorer::new(Arc::new(store.clone()))
    }

    #[test]
    fn test_absent_returns_none() {
        let store = MemoryStore::new();
        let restored: Option<Snapshot<Value>> = restorer(&store).restore_at(Some("u1"), None, NOW);
        assert!(restored.is_none());
    }

    #[test]
    fn test_fresh_snapshot_returned_unchanged() {
        let store = MemoryStore::new();
        put(&store, "onboarding_progress_u1", NOW - 6 * DAY_MS);

        let restored: Snapshot<Value> = restorer(&store)
            .restore_at(Some("u1"), None, NOW)
            .unwrap();

        assert_eq!(restored.payload["firstName"], "Grace");
        assert_eq!(restored.step_index, 3);
        assert_eq!(restored.saved_at_epoch_ms, NOW - 6 * DAY_MS);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_stale_snapshot_is_removed() {
        let store = MemoryStore::new();
        put(&store, "onboarding_progress_u1", NOW - 8 * DAY_MS);

        let restored: Option<Snapshot<Value>> = restorer(&store).restore_at(Some("u1"), None, NOW);

        assert!(restored.is_none());
        assert!(store.get("onboarding_progress_u1").unwrap().is_none());
    }

    #[test]
    fn test_exactly_ttl_old_is_still_fresh() {
        let store = MemoryStore::new();
        put(&store, "onboarding_progress", NOW - 7 * DAY_MS);

        let restored: Option<Snapshot<Value>> = restorer(&store).restore_at(None, None, NOW);
        assert!(restored.is_some());
    }

    #[test]
    fn test_corrupt_data_treated_as_absent_and_kept() {
        let store = MemoryStore::new();
        store.set("onboarding_progress_u1", "{not json").unwrap();

        let restored: Option<Snapshot<Value>> = restorer(&store).restore_at(Some("u1"), None, NOW);

        assert!(restored.is_none());
        assert!(store.get("onboarding_progress_u1").unwrap().is_some());
    }

    #[test]
    fn test_wrong_shape_treated_as_absent() {
        let store = MemoryStore::new();
        store
            .set("onboarding_progress_u1", r#"{"payload": {}, "stepIndex": -1}"#)
            .unwrap();

        let restored: Option<Snapshot<Value>> = restorer(&store).restore_at(Some("u1"), None, NOW);
        assert!(restored.is_none());
    }

    #[test]
    fn test_store_failure_treated_as_absent() {
        let store = MemoryStore::new();
        put(&store, "onboarding_progress_u1", NOW);
        store.set_failing(true);

        let restored: Option<Snapshot<Value>> = restorer(&store).restore_at(Some("u1"), None, NOW);
        assert!(restored.is_none());
    }

    #[test]
    fn test_custom_ttl() {
        let store = MemoryStore::new();
        put(&store, "onboarding_progress_u1", NOW - 2 * DAY_MS);

        let restored: Option<Snapshot<Value>> = restorer(&store)
            .with_ttl(Duration::from_secs(24 * 60 * 60))
            .restore_at(Some("u1"), None, NOW);

        assert!(restored.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_huge_configured_ttl_keeps_fresh_snapshot() {
        let store = MemoryStore::new();
        put(&store, "onboarding_progress_u1", NOW);
        let config = AutoSaveConfig {
            debounce_ms: 500,
            ttl_days: 200_000_000_000,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        };

        let restored: Option<Snapshot<Value>> =
            ProgressRestorer::from_config(Arc::new(store.clone()), &config)
                .restore_at(Some("u1"), None, NOW);

        assert!(restored.is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_explicit_storage_key() {
        let store = MemoryStore::new();
        put(&store, "retirement_wizard", NOW);

        let restored: Option<Snapshot<Value>> =
            restorer(&store).restore_at(Some("ignored"), Some("retirement_wizard"), NOW);
        assert!(restored.is_some());
    }
}
