//! Local caching for offline and low-traffic loads.
//!
//! `KeyValueStore` is the persistent key-value seam: `FileStore` keeps every
//! key in one JSON document on disk, `MemoryStore` backs tests and ephemeral
//! runs. `CacheManager` stores the last manifest payload together with its
//! freshness marker on top of either.

pub mod manager;
pub mod store;

pub use manager::{CacheEntry, CacheManager, MARKER_KEY, PAYLOAD_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore};
