//! Manifest/cache reconciliation.
//!
//! Every load fetches the manifest (it is small and carries the freshness
//! marker). The cached game list is reused when the manifest's marker equals
//! the stored one, replaced when it differs, and ignored entirely for
//! unversioned manifests. When the manifest cannot be fetched or parsed, a
//! cache entry younger than [`CACHE_MAX_AGE_SECS`] is served instead.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::api::RemoteSource;
use crate::cache::{CacheEntry, CacheManager, KeyValueStore};
use crate::error::LoadError;
use crate::models::{Dataset, FreshnessMarker, ManifestShape};
use crate::utils::format_age;

/// Oldest cache entry (by marker timestamp) usable when the manifest fetch fails.
pub const CACHE_MAX_AGE_SECS: i64 = 60 * 60;

/// How the returned game list relates to the remote source.
#[derive(Debug, Clone, PartialEq)]
pub enum Freshness {
    /// Marker unchanged; served from cache without further requests
    Cached { marker: FreshnessMarker },
    /// Marker changed or nothing was cached; cache rewritten
    Refreshed { marker: FreshnessMarker },
    /// Manifest has no marker; fetched fresh and not cached
    Unversioned,
    /// Manifest unavailable; served from a recent cache entry
    Degraded {
        marker: FreshnessMarker,
        age: Duration,
        reason: String,
    },
}

impl Freshness {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Freshness::Degraded { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            Freshness::Cached { marker } => {
                format!("cached (unchanged since {})", marker_label(marker))
            }
            Freshness::Refreshed { marker } => {
                format!("refreshed (updated {})", marker_label(marker))
            }
            Freshness::Unversioned => "fetched (legacy format, caching disabled)".to_string(),
            Freshness::Degraded { age, .. } => {
                format!("offline fallback (cache {})", format_age(*age))
            }
        }
    }
}

fn marker_label(marker: &FreshnessMarker) -> String {
    marker
        .as_datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| marker.to_string())
}

/// Result of one reconciliation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetLoad {
    pub games: Dataset,
    pub freshness: Freshness,
}

pub struct Reconciler<'a, R: RemoteSource + ?Sized, S: KeyValueStore> {
    source: &'a R,
    cache: &'a mut CacheManager<S>,
}

impl<'a, R: RemoteSource + ?Sized, S: KeyValueStore> Reconciler<'a, R, S> {
    pub fn new(source: &'a R, cache: &'a mut CacheManager<S>) -> Self {
        Self { source, cache }
    }

    pub async fn load_dataset(&mut self) -> Result<DatasetLoad, LoadError> {
        self.load_dataset_at(Utc::now()).await
    }

    /// Reconcile using `now` for the fallback age check.
    pub async fn load_dataset_at(&mut self, now: DateTime<Utc>) -> Result<DatasetLoad, LoadError> {
        let cached = self.read_cache();

        match self.fetch_manifest().await {
            Ok(shape) => Ok(self.reconcile(shape, cached)),
            Err(error) => {
                warn!(error = %error, "Error loading game data");
                Self::fall_back(cached, error, now)
            }
        }
    }

    fn read_cache(&self) -> Option<CacheEntry> {
        match self.cache.load_entry() {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable game data cache");
                None
            }
        }
    }

    async fn fetch_manifest(&self) -> Result<ManifestShape, LoadError> {
        let document = self.source.fetch_manifest().await?;
        ManifestShape::detect(document)
    }

    fn reconcile(&mut self, shape: ManifestShape, cached: Option<CacheEntry>) -> DatasetLoad {
        let Some(marker) = shape.marker().cloned() else {
            if shape.is_versioned() {
                info!("game-data.json has no last_updated - caching disabled");
            } else {
                info!("Using old format game-data.json (no timestamp) - caching disabled");
            }
            return DatasetLoad {
                games: shape.into_games(),
                freshness: Freshness::Unversioned,
            };
        };

        if let Some(entry) = cached {
            if entry.marker == marker {
                info!(marker = %marker, "Using cached game data - no changes detected");
                return DatasetLoad {
                    games: entry.payload,
                    freshness: Freshness::Cached { marker },
                };
            }
            debug!(cached = %entry.marker, remote = %marker, "Game data marker changed");
        }

        let games = shape.into_games();
        match self.cache.save_entry(&marker, &games) {
            Ok(()) => {
                info!(marker = %marker, games = games.len(), "Game data changed, cache updated")
            }
            Err(e) => warn!(error = %e, "Failed to cache game data"),
        }

        DatasetLoad {
            games,
            freshness: Freshness::Refreshed { marker },
        }
    }

    fn fall_back(
        cached: Option<CacheEntry>,
        error: LoadError,
        now: DateTime<Utc>,
    ) -> Result<DatasetLoad, LoadError> {
        let Some(entry) = cached else {
            return Err(error);
        };

        match entry.age_at(now) {
            Some(age) if age < Duration::seconds(CACHE_MAX_AGE_SECS) => {
                warn!(
                    age_minutes = age.num_minutes(),
                    "Using fallback cached data due to error"
                );
                Ok(DatasetLoad {
                    games: entry.payload,
                    freshness: Freshness::Degraded {
                        marker: entry.marker,
                        age,
                        reason: error.to_string(),
                    },
                })
            }
            Some(age) => {
                debug!(age_minutes = age.num_minutes(), "Cached data too old for fallback");
                Err(error)
            }
            None => {
                debug!(marker = %entry.marker, "Cached marker is not a timestamp, no fallback");
                Err(error)
            }
        }
    }
}
