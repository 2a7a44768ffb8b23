//! End-to-end load: pick a discovery path, reconcile, aggregate.
//!
//! Repositories served from GitHub Pages are first listed directly (one
//! folder per game). When the listing is unavailable or empty, the
//! consolidated manifest is used through the reconciliation engine.

use tracing::{info, warn};

use crate::api::RemoteSource;
use crate::cache::{CacheManager, KeyValueStore};
use crate::config::RemoteConfig;
use crate::error::LoadError;
use crate::models::GameCollection;

use super::aggregate::{load_from_descriptors, load_from_directory, ProgressObserver, SkippedItem};
use super::reconcile::{Freshness, Reconciler};

/// Where the games came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataOrigin {
    /// Per-game folders found by listing the repository
    Directory { listed: usize },
    /// The consolidated manifest, possibly served from cache
    Manifest(Freshness),
}

impl DataOrigin {
    pub fn describe(&self) -> String {
        match self {
            DataOrigin::Directory { listed } => format!("{} game folders", listed),
            DataOrigin::Manifest(freshness) => format!("game-data.json, {}", freshness.describe()),
        }
    }
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub collection: GameCollection,
    pub skipped: Vec<SkippedItem>,
    pub origin: DataOrigin,
}

/// Run a full load against `source`, using `cache` for the manifest path.
///
/// Only manifest-level failures are returned as errors; per-game failures
/// end up in [`LoadOutcome::skipped`].
pub async fn load_games<R, S>(
    remote: &RemoteConfig,
    source: &R,
    cache: &mut CacheManager<S>,
    observer: &mut dyn ProgressObserver,
) -> Result<LoadOutcome, LoadError>
where
    R: RemoteSource + ?Sized,
    S: KeyValueStore,
{
    let mut collection = GameCollection::new();

    if remote.identity.is_pages_site {
        match source.list_available_ids().await {
            Ok(ids) if !ids.is_empty() => {
                info!(count = ids.len(), "Loading games from repository folders");
                let skipped = load_from_directory(source, &ids, &mut collection, observer).await;
                return Ok(LoadOutcome {
                    collection,
                    skipped,
                    origin: DataOrigin::Directory { listed: ids.len() },
                });
            }
            Ok(_) => info!("No game folders listed, falling back to game-data.json"),
            Err(e) => {
                warn!(error = %e, "Could not list game folders, falling back to game-data.json")
            }
        }
    }

    let load = Reconciler::new(source, cache).load_dataset().await?;
    let skipped = load_from_descriptors(&load.games, &mut collection, observer);

    Ok(LoadOutcome {
        collection,
        skipped,
        origin: DataOrigin::Manifest(load.freshness),
    })
}
