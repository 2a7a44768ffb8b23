use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

/// Store file name in the cache directory
const STORE_FILE: &str = "store.json";

/// A small persistent string store.
///
/// Writes go through `set_many` so that related keys are committed together.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Read several keys from one snapshot of the store.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Write every entry, or none of them.
    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()>;

    fn remove_many(&mut self, keys: &[&str]) -> Result<()>;
}

/// All keys in one JSON object on disk.
///
/// Commits write a sibling temp file and rename it over the store, so a
/// crash mid-write leaves the previous contents intact.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self {
            path: cache_dir.join(STORE_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cache store: {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache store: {}", self.path.display()))
    }

    /// Current contents for a read-modify-write. A corrupt store is replaced.
    fn read_for_update(&self) -> BTreeMap<String, String> {
        match self.read_all() {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable cache store");
                BTreeMap::new()
            }
        }
    }

    fn commit(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string(map)?;
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let mut map = self.read_all()?;
        Ok(keys.iter().map(|key| map.remove(*key)).collect())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        let mut map = self.read_for_update();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        self.commit(&map)
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
        let mut map = self.read_for_update();
        for key in keys {
            map.remove(*key);
        }
        self.commit(&map)
    }
}

/// In-process store. Counts commits so callers can tell whether anything
/// was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), value.clone());
        }
        self.commits += 1;
        Ok(())
    }

    fn remove_many(&mut self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        self.commits += 1;
        Ok(())
    }
}
