use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::{Dataset, FreshnessMarker};
use crate::utils::format_age;

use super::store::{FileStore, KeyValueStore};

/// Store key holding the last seen `last_updated` marker
pub const MARKER_KEY: &str = "game-data-last-updated";

/// Store key holding the serialized game list
pub const PAYLOAD_KEY: &str = "game-data-cache";

/// The last manifest payload stored together with its marker.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub marker: FreshnessMarker,
    pub payload: Dataset,
}

impl CacheEntry {
    /// Time elapsed since the marker's timestamp. `None` when the marker is
    /// not a timestamp.
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.marker.as_datetime().map(|updated| now - updated)
    }

    pub fn age_display_at(&self, now: DateTime<Utc>) -> String {
        match self.age_at(now) {
            Some(age) => format_age(age),
            None => "unknown".to_string(),
        }
    }
}

pub struct CacheManager<S: KeyValueStore> {
    store: S,
}

impl CacheManager<FileStore> {
    /// File-backed cache under `cache_dir`.
    pub fn open(cache_dir: &Path) -> Result<Self> {
        Ok(Self::new(FileStore::new(cache_dir)?))
    }
}

impl<S: KeyValueStore> CacheManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the cached entry. Both keys must be present; a half-written
    /// entry counts as no entry.
    pub fn load_entry(&self) -> Result<Option<CacheEntry>> {
        let mut values = self.store.get_many(&[MARKER_KEY, PAYLOAD_KEY])?.into_iter();

        let (Some(Some(marker)), Some(Some(payload))) = (values.next(), values.next()) else {
            debug!("No complete cache entry");
            return Ok(None);
        };

        let payload: Dataset = serde_json::from_str(&payload)
            .context("Failed to parse cached game data")?;

        Ok(Some(CacheEntry {
            marker: FreshnessMarker::new(marker),
            payload,
        }))
    }

    /// Replace the cached entry. Marker and payload are committed together.
    pub fn save_entry(&mut self, marker: &FreshnessMarker, payload: &Dataset) -> Result<()> {
        let serialized = serde_json::to_string(payload)?;
        self.store.set_many(&[
            (MARKER_KEY, marker.as_str().to_string()),
            (PAYLOAD_KEY, serialized),
        ])
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove_many(&[MARKER_KEY, PAYLOAD_KEY])
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::models::GameDescriptor;
    use serde_json::json;

    fn dataset() -> Dataset {
        vec![GameDescriptor {
            appid: json!(440),
            achievements: json!([{"apiname": "A1", "achieved": 1, "unlocktime": 1000}]),
            info: Some(json!({"name": "TF2", "blacklist": []})),
        }]
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let mut cache = CacheManager::new(MemoryStore::new());
        assert_eq!(cache.load_entry().unwrap(), None);

        let marker = FreshnessMarker::new("1700000000");
        cache.save_entry(&marker, &dataset()).unwrap();

        let entry = cache.load_entry().unwrap().unwrap();
        assert_eq!(entry.marker, marker);
        assert_eq!(entry.payload, dataset());
        assert_eq!(cache.store().commit_count(), 1);
    }

    #[test]
    fn test_half_written_entry_is_absent() {
        let mut store = MemoryStore::new();
        store.set_many(&[(MARKER_KEY, "1".to_string())]).unwrap();
        let cache = CacheManager::new(store);
        assert_eq!(cache.load_entry().unwrap(), None);
    }

    #[test]
    fn test_corrupt_payload_is_an_error() {
        let mut store = MemoryStore::new();
        store
            .set_many(&[(MARKER_KEY, "1".to_string()), (PAYLOAD_KEY, "{".to_string())])
            .unwrap();
        assert!(CacheManager::new(store).load_entry().is_err());
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let mut cache = CacheManager::new(MemoryStore::new());
        cache.save_entry(&FreshnessMarker::new("5"), &dataset()).unwrap();
        cache.clear().unwrap();
        assert!(cache.store().is_empty());
    }

    #[test]
    fn test_entry_age() {
        let now = Utc::now();
        let entry = CacheEntry {
            marker: FreshnessMarker::new((now - Duration::minutes(90)).timestamp().to_string()),
            payload: Vec::new(),
        };
        assert_eq!(entry.age_at(now).unwrap().num_minutes(), 90);
        assert_eq!(entry.age_display_at(now), "2h ago");

        let unversioned = CacheEntry {
            marker: FreshnessMarker::new("v2"),
            payload: Vec::new(),
        };
        assert_eq!(unversioned.age_at(now), None);
        assert_eq!(unversioned.age_display_at(now), "unknown");
    }

    #[test]
    fn test_file_backed_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = CacheManager::open(dir.path()).unwrap();
        cache.save_entry(&FreshnessMarker::new("42"), &dataset()).unwrap();

        let reopened = CacheManager::open(dir.path()).unwrap();
        assert_eq!(reopened.load_entry().unwrap().unwrap().payload, dataset());
    }
}
