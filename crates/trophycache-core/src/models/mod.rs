//! Data models for achievement showcase repositories.
//!
//! - `ManifestShape`, `GameDescriptor`, `FreshnessMarker`: the consolidated
//!   `game-data.json` document and its versioning token
//! - `RawAchievements`, `CanonicalAchievement`: historical progress payload
//!   shapes and their normalized form
//! - `GameInfo`, `GameRecord`, `GameCollection`: per-game definitions and
//!   the aggregated result
//! - `RepoIdentity`: which repository the data lives in

pub mod achievement;
pub mod game;
pub mod identity;
pub mod manifest;

pub use achievement::{CanonicalAchievement, RawAchievements, ACHIEVEMENT_FIELDS};
pub use game::{GameCollection, GameInfo, GameRecord};
pub use identity::RepoIdentity;
pub use manifest::{Dataset, FreshnessMarker, GameDescriptor, ManifestShape};
