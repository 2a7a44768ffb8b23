//! Load orchestration: cache reconciliation, aggregation, and the full
//! pipeline tying them to a remote source.

pub mod aggregate;
pub mod pipeline;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{
    build_record, load_from_descriptors, load_from_directory, normalize_achievements,
    process_item, process_payload, NoProgress, ProgressObserver, SkippedItem,
};
pub use pipeline::{load_games, DataOrigin, LoadOutcome};
pub use reconcile::{DatasetLoad, Freshness, Reconciler, CACHE_MAX_AGE_SECS};
