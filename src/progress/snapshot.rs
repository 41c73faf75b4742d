//! Persisted wizard progress and the keys it is stored under.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Key prefix used when no explicit storage key is given
pub const DEFAULT_KEY_PREFIX: &str = "onboarding_progress";

/// One saved point in the wizard: the collected data plus the step the user
/// was on. Each save fully overwrites the previous snapshot for its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<T> {
    pub payload: T,
    pub step_index: usize,
    pub saved_at_epoch_ms: i64,
}

impl<T> Snapshot<T> {
    /// Build a snapshot stamped with the current time
    pub fn now(payload: T, step_index: usize) -> Self {
        Self {
            payload,
            step_index,
            saved_at_epoch_ms: now_epoch_ms(),
        }
    }

    /// Age of the snapshot relative to `now_ms`, negative if saved in the future
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.saved_at_epoch_ms
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Resolve where a snapshot lives.
///
/// An explicit `storage_key` wins. Otherwise the key is `<prefix>_<identity>`,
/// or just `<prefix>` for anonymous sessions.
pub fn storage_key(prefix: &str, storage_key: Option<&str>, identity: Option<&str>) -> String {
    if let Some(key) = storage_key {
        return key.to_string();
    }
    match identity.filter(|id| !id.is_empty()) {
        Some(id) => format!("{}_{}", prefix, id),
        None => prefix.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storage_key_prefers_explicit_key() {
        assert_eq!(
            storage_key(DEFAULT_KEY_PREFIX, Some("custom"), Some("u1")),
            "custom"
        );
    }

    #[test]
    fn test_storage_key_uses_identity() {
        assert_eq!(
            storage_key(DEFAULT_KEY_PREFIX, None, Some("u1")),
            "onboarding_progress_u1"
        );
    }

    #[test]
    fn test_storage_key_anonymous() {
        assert_eq!(
            storage_key(DEFAULT_KEY_PREFIX, None, None),
            "onboarding_progress"
        );
        assert_eq!(
            storage_key(DEFAULT_KEY_PREFIX, None, Some("")),
            "onboarding_progress"
        );
    }

    #[test]
    fn test_snapshot_wire_format_uses_camel_case() {
        let snapshot = Snapshot {
            payload: json!({"firstName": "Ada"}),
            step_index: 2,
            saved_at_epoch_ms: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["stepIndex"], 2);
        assert_eq!(value["savedAtEpochMs"], 1_700_000_000_000_i64);
        assert_eq!(value["payload"]["firstName"], "Ada");
    }

    #[test]
    fn test_age_ms() {
        let snapshot = Snapshot {
            payload: (),
            step_index: 0,
            saved_at_epoch_ms: 1_000,
        };
        assert_eq!(snapshot.age_ms(1_500), 500);
        assert_eq!(snapshot.age_ms(500), -500);
    }
}
