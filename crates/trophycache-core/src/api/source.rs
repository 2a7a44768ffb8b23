use async_trait::async_trait;
use serde_json::Value;

use super::ApiError;

/// Progress payload for one game, as fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPayload {
    pub record: Value,
    /// Served from the alternate `{id}.db` store rather than `achievements.json`
    pub alternate: bool,
}

/// Everything the load pipeline needs from the remote side.
///
/// Each call may fail independently. Missing definitions are not an error.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// The consolidated `game-data.json` document, bypassing HTTP caches.
    async fn fetch_manifest(&self) -> Result<Value, ApiError>;

    /// Progress for one game: primary format first, then the alternate store.
    async fn fetch_item_payload(&self, id: &str) -> Result<ItemPayload, ApiError>;

    /// Per-game definitions, if the repository has any for this id.
    async fn fetch_item_definitions(&self, id: &str) -> Option<Value>;

    /// Game ids discovered by listing the repository, in listing order.
    async fn list_available_ids(&self) -> Result<Vec<String>, ApiError>;
}
