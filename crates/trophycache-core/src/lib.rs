//! Core library for trophycache.
//!
//! Loads per-game achievement data published in a GitHub repository,
//! either folder-per-game or as one consolidated `game-data.json`, and keeps
//! a local copy that is reused while the remote `last_updated` marker is
//! unchanged and served as a fallback when the network is unavailable.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod sync;
pub mod utils;

pub use api::{ApiError, GithubClient, RemoteSource};
pub use cache::{CacheManager, FileStore, KeyValueStore, MemoryStore};
pub use config::{Config, RemoteConfig};
pub use error::LoadError;
pub use models::{CanonicalAchievement, GameCollection, GameRecord, RepoIdentity};
pub use sync::{load_games, DataOrigin, Freshness, LoadOutcome, ProgressObserver};
