//! In-memory remote source for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::api::{ApiError, ItemPayload, RemoteSource};
use crate::cache::{KeyValueStore, MemoryStore};

/// Serves canned documents and records every call by name.
#[derive(Default)]
pub struct FakeSource {
    manifest: Option<Value>,
    items: HashMap<String, ItemPayload>,
    definitions: HashMap<String, Value>,
    listing: Option<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_manifest(manifest: Value) -> Self {
        Self {
            manifest: Some(manifest),
            ..Self::default()
        }
    }

    pub fn failing_manifest() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, id: &str, record: Value, alternate: bool) -> Self {
        self.items
            .insert(id.to_string(), ItemPayload { record, alternate });
        self
    }

    pub fn with_definitions(mut self, id: &str, info: Value) -> Self {
        self.definitions.insert(id.to_string(), info);
        self
    }

    pub fn with_listing(mut self, ids: &[&str]) -> Self {
        self.listing = Some(ids.iter().map(|id| id.to_string()).collect());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteSource for FakeSource {
    async fn fetch_manifest(&self) -> Result<Value, ApiError> {
        self.record("manifest".to_string());
        self.manifest.clone().ok_or_else(|| {
            ApiError::from_status(StatusCode::BAD_GATEWAY, "game-data.json", "offline")
        })
    }

    async fn fetch_item_payload(&self, id: &str) -> Result<ItemPayload, ApiError> {
        self.record(format!("item:{}", id));
        self.items
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("AppID/{}/achievements.json", id)))
    }

    async fn fetch_item_definitions(&self, id: &str) -> Option<Value> {
        self.record(format!("definitions:{}", id));
        self.definitions.get(id).cloned()
    }

    async fn list_available_ids(&self) -> Result<Vec<String>, ApiError> {
        self.record("listing".to_string());
        self.listing.clone().ok_or_else(|| {
            let body = "API rate limit exceeded";
            ApiError::from_status(StatusCode::FORBIDDEN, "contents/AppID", body)
        })
    }
}

/// Store whose reads and writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl FlakyStore {
    pub fn failing_writes(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn failing_reads(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_reads: true,
            ..Self::default()
        }
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        if self.fail_reads {
            anyhow::bail!("store unreadable");
        }
        self.inner.get(key)
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> anyhow::Result<()> {
        if self.fail_writes {
            anyhow::bail!("disk full");
        }
        self.inner.set_many(entries)
    }

    fn remove_many(&mut self, keys: &[&str]) -> anyhow::Result<()> {
        if self.fail_writes {
            anyhow::bail!("disk full");
        }
        self.inner.remove_many(keys)
    }
}
