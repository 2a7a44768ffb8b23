//! Folding raw per-game payloads into canonical [`GameRecord`]s.
//!
//! When definitions carry an achievement schema, the schema decides which
//! achievements exist and in what order, and progress is looked up by id.
//! Otherwise the progress payload is authoritative and also supplies the
//! metadata. Blacklisted ids are dropped in both cases.
//!
//! Batches run strictly one game at a time. A game that fails to normalize
//! is logged and skipped; it never aborts the batch.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{ItemPayload, RemoteSource};
use crate::error::LoadError;
use crate::models::{
    CanonicalAchievement, GameCollection, GameDescriptor, GameInfo, GameRecord, RawAchievements,
};

/// Receives `(current, total)` before each game is processed. `current` is 1-based.
pub trait ProgressObserver {
    fn on_progress(&mut self, current: usize, total: usize);
}

impl<F: FnMut(usize, usize)> ProgressObserver for F {
    fn on_progress(&mut self, current: usize, total: usize) {
        self(current, total)
    }
}

/// Observer that ignores progress.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _current: usize, _total: usize) {}
}

/// A game left out of the collection, and why.
#[derive(Debug)]
pub struct SkippedItem {
    pub id: String,
    pub error: LoadError,
}

/// Normalize one game's achievements against its optional definitions.
pub fn normalize_achievements(
    raw: &Value,
    info: Option<&GameInfo>,
) -> Result<Vec<CanonicalAchievement>, String> {
    let progress = RawAchievements::detect(raw)?.into_entries();
    let is_blacklisted = |id: &str| {
        let listed = info.is_some_and(|i| i.is_blacklisted(id));
        if listed {
            debug!(achievement = id, "Skipping blacklisted achievement");
        }
        listed
    };

    let achievements = match info.and_then(|i| i.achievements.as_ref()) {
        Some(schema) => schema
            .iter()
            .filter(|(id, _)| !is_blacklisted(id.as_str()))
            .map(|(id, definition)| {
                let empty = serde_json::Map::new();
                let metadata = definition.as_object().unwrap_or(&empty);
                CanonicalAchievement::resolve(id, metadata, progress.get(id))
            })
            .collect(),
        None => progress
            .iter()
            .filter(|(id, _)| !is_blacklisted(id.as_str()))
            .map(|(id, entry)| CanonicalAchievement::resolve(id, entry, Some(entry)))
            .collect(),
    };

    Ok(achievements)
}

/// Build a game record without touching any collection.
pub fn build_record(
    id: &str,
    raw: &Value,
    definitions: Option<&Value>,
    alternate_store: bool,
) -> Result<GameRecord, LoadError> {
    if id.is_empty() {
        return Err(LoadError::item(id, "missing appid"));
    }

    let info = definitions
        .filter(|d| !d.is_null())
        .map(GameInfo::from_json)
        .transpose()
        .map_err(|reason| LoadError::item(id, reason))?;

    let achievements =
        normalize_achievements(raw, info.as_ref()).map_err(|reason| LoadError::item(id, reason))?;

    let info = info.unwrap_or_default();
    Ok(GameRecord {
        id: id.to_string(),
        name: info.name.unwrap_or_else(|| format!("Game {}", id)),
        icon: info.icon.unwrap_or_default(),
        achievements,
        uses_alternate_store: info.uses_db || alternate_store,
        platform: info.platform,
    })
}

/// Normalize one game and insert it, replacing any record with the same id.
pub fn process_item<'c>(
    collection: &'c mut GameCollection,
    id: &str,
    raw: &Value,
    definitions: Option<&Value>,
) -> Result<&'c GameRecord, LoadError> {
    let record = build_record(id, raw, definitions, false)?;
    Ok(collection.upsert(record))
}

/// Like [`process_item`], for a payload fetched from the repository tree.
pub fn process_payload<'c>(
    collection: &'c mut GameCollection,
    id: &str,
    payload: &ItemPayload,
    definitions: Option<&Value>,
) -> Result<&'c GameRecord, LoadError> {
    let record = build_record(id, &payload.record, definitions, payload.alternate)?;
    Ok(collection.upsert(record))
}

fn skip(id: String, error: LoadError) -> SkippedItem {
    warn!(id = %id, error = %error, "Skipping game");
    SkippedItem { id, error }
}

/// Process every game in a manifest, in order.
pub fn load_from_descriptors(
    descriptors: &[GameDescriptor],
    collection: &mut GameCollection,
    observer: &mut dyn ProgressObserver,
) -> Vec<SkippedItem> {
    let total = descriptors.len();
    let mut skipped = Vec::new();

    for (index, descriptor) in descriptors.iter().enumerate() {
        observer.on_progress(index + 1, total);
        let id = descriptor.id();
        if let Err(error) = process_item(
            collection,
            &id,
            &descriptor.achievements,
            descriptor.info.as_ref(),
        ) {
            // Entries without an appid are reported by position
            let label = if id.is_empty() {
                format!("entry #{}", index + 1)
            } else {
                id
            };
            skipped.push(skip(label, error));
        }
    }

    info!(loaded = total - skipped.len(), skipped = skipped.len(), "Processed manifest games");
    skipped
}

/// Fetch and process each listed game directory, one at a time.
pub async fn load_from_directory<R: RemoteSource + ?Sized>(
    source: &R,
    ids: &[String],
    collection: &mut GameCollection,
    observer: &mut dyn ProgressObserver,
) -> Vec<SkippedItem> {
    let total = ids.len();
    let mut skipped = Vec::new();

    for (index, id) in ids.iter().enumerate() {
        observer.on_progress(index + 1, total);

        let payload = match source.fetch_item_payload(id).await {
            Ok(payload) => payload,
            Err(e) => {
                let error = LoadError::item(id, format!("no achievements file ({})", e));
                skipped.push(skip(id.clone(), error));
                continue;
            }
        };
        let definitions = source.fetch_item_definitions(id).await;

        if let Err(error) = process_payload(collection, id, &payload, definitions.as_ref()) {
            skipped.push(skip(id.clone(), error));
        }
    }

    info!(loaded = total - skipped.len(), skipped = skipped.len(), "Processed game directories");
    skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::FakeSource;
    use serde_json::json;

    #[test]
    fn test_list_payload_without_definitions() {
        let mut games = GameCollection::new();
        let record = process_item(
            &mut games,
            "440",
            &json!([{"apiname": "A1", "achieved": 1, "unlocktime": 1000}]),
            None,
        )
        .unwrap();

        assert_eq!(record.name, "Game 440");
        assert_eq!(record.achievements.len(), 1);
        let ach = &record.achievements[0];
        assert_eq!(ach.id, "A1");
        assert!(ach.unlocked);
        assert_eq!(ach.unlocked_at, 1000);
        assert!(games.contains("440"));
    }

    #[test]
    fn test_blacklisted_definition_is_dropped() {
        let mut games = GameCollection::new();
        let definitions = json!({
            "achievements": {"A1": {"name": "First Blood"}, "A2": {"name": "Second"}},
            "blacklist": ["A1"]
        });
        let record = process_item(
            &mut games,
            "1",
            &json!({"A1": {"earned": true, "earned_time": 5}}),
            Some(&definitions),
        )
        .unwrap();

        let ids: Vec<&str> = record.achievements.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["A2"]);
        assert!(!record.achievements[0].unlocked);
        assert_eq!(record.achievements[0].unlocked_at, 0);
    }

    #[test]
    fn test_blacklist_applies_without_schema() {
        let achievements = normalize_achievements(
            &json!({"A1": {"earned": true}, "A2": {"earned": false}}),
            Some(&GameInfo::from_json(&json!({"blacklist": ["A2"]})).unwrap()),
        )
        .unwrap();
        assert_eq!(achievements.len(), 1);
        assert_eq!(achievements[0].id, "A1");
    }

    #[test]
    fn test_definitions_drive_order_and_metadata() {
        let definitions = json!({
            "name": "Portal",
            "icon": "portal.jpg",
            "platform": "steam",
            "achievements": {
                "Z": {"name": "Last", "hidden": true, "percent": 3.5, "icon": "z.png"},
                "A": {"description": "First listed in progress"}
            }
        });
        let raw = json!({"achievements": {
            "A": {"unlocked": true, "unlock_time": 77},
            "Z": {"achieved": 1, "unlocktime": 88},
            "EXTRA": {"earned": true}
        }});

        let record = build_record("400", &raw, Some(&definitions), false).unwrap();

        assert_eq!(record.name, "Portal");
        assert_eq!(record.platform.as_deref(), Some("steam"));
        let ids: Vec<&str> = record.achievements.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["Z", "A"]);

        let z = &record.achievements[0];
        assert_eq!(z.name, "Last");
        assert!(z.hidden);
        assert_eq!(z.rarity, Some(3.5));
        assert_eq!(z.icongray, "z.png");
        assert_eq!(z.unlocked_at, 88);

        let a = &record.achievements[1];
        assert_eq!(a.name, "A");
        assert!(a.unlocked);
        assert_eq!(a.unlocked_at, 77);
    }

    #[test]
    fn test_definitions_without_schema_use_progress_metadata() {
        let record = build_record(
            "9",
            &json!({"X": {"displayName": "Shown", "desc": "d", "earned": false}}),
            Some(&json!({"name": "Nine", "uses_db": true})),
            false,
        )
        .unwrap();
        assert_eq!(record.name, "Nine");
        assert!(record.uses_alternate_store);
        assert_eq!(record.achievements[0].name, "Shown");
        assert_eq!(record.achievements[0].description, "d");
    }

    #[test]
    fn test_bad_payloads_are_item_errors() {
        let mut games = GameCollection::new();
        assert!(matches!(
            process_item(&mut games, "1", &json!("oops"), None),
            Err(LoadError::ItemProcessing { .. })
        ));
        assert!(matches!(
            process_item(&mut games, "2", &json!({}), Some(&json!(["not", "an", "object"]))),
            Err(LoadError::ItemProcessing { .. })
        ));
        assert!(matches!(
            process_item(&mut games, "", &json!({}), None),
            Err(LoadError::ItemProcessing { .. })
        ));
        assert!(games.is_empty());
    }

    #[test]
    fn test_reprocessing_overwrites() {
        let mut games = GameCollection::new();
        process_item(&mut games, "1", &json!({"A": {"earned": false}}), None).unwrap();
        process_item(&mut games, "1", &json!({"A": {"earned": true}, "B": {}}), None).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games.get("1").unwrap().unlocked_count(), 1);
        assert_eq!(games.get("1").unwrap().total_count(), 2);
    }

    #[test]
    fn test_batch_skips_failing_item_and_keeps_order() {
        let descriptors: Vec<GameDescriptor> = serde_json::from_value(json!([
            {"appid": 1, "achievements": {"A": {"earned": true}}},
            {"appid": 2, "achievements": 42},
            {"appid": 3, "achievements": []}
        ]))
        .unwrap();

        let mut games = GameCollection::new();
        let mut seen = Vec::new();
        let skipped =
            load_from_descriptors(&descriptors, &mut games, &mut |current: usize, total: usize| {
                seen.push((current, total))
            });

        assert_eq!(games.ids().collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].id, "2");
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_batch_skips_entries_that_are_not_games() {
        let descriptors: Vec<GameDescriptor> = serde_json::from_value(json!([
            {"appid": 1, "achievements": {"A": {"earned": true}}},
            null,
            "x",
            {"achievements": {}},
            {"appid": 3, "achievements": []}
        ]))
        .unwrap();

        let mut games = GameCollection::new();
        let skipped = load_from_descriptors(&descriptors, &mut games, &mut NoProgress);

        assert_eq!(games.ids().collect::<Vec<_>>(), vec!["1", "3"]);
        let labels: Vec<&str> = skipped.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(labels, vec!["entry #2", "entry #3", "entry #4"]);
        assert!(skipped
            .iter()
            .all(|s| matches!(s.error, LoadError::ItemProcessing { .. })));
    }

    #[tokio::test]
    async fn test_directory_batch_uses_alternate_store_and_definitions() {
        let source = FakeSource::default()
            .with_item("10", json!([{"apiname": "A", "achieved": 1, "unlocktime": 3}]), false)
            .with_item("20", json!({"B": {"earned": true}}), true)
            .with_definitions("20", json!({"name": "Twenty", "blacklist": []}));
        let ids = vec!["10".to_string(), "missing".to_string(), "20".to_string()];

        let mut games = GameCollection::new();
        let skipped = load_from_directory(&source, &ids, &mut games, &mut NoProgress).await;

        assert_eq!(games.ids().collect::<Vec<_>>(), vec!["10", "20"]);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].id, "missing");
        assert!(!games.get("10").unwrap().uses_alternate_store);
        assert!(games.get("20").unwrap().uses_alternate_store);
        assert_eq!(games.get("20").unwrap().name, "Twenty");
    }
}
