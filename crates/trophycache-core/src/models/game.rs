//! Game-level models: per-game definitions, the canonical game record, and
//! the ordered collection handed to renderers.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::achievement::{as_flag, as_text, CanonicalAchievement, RawEntry};
use super::manifest::json_kind;
use crate::utils::calculate_percentage;

/// Per-game definitions (`game-info.json`, or `info` in the manifest).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameInfo {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub uses_db: bool,
    pub platform: Option<String>,
    pub blacklist: HashSet<String>,
    /// Achievement schema keyed by id, in document order
    pub achievements: Option<RawEntry>,
}

impl GameInfo {
    /// Read definitions leniently: wrong-typed optional fields are ignored,
    /// but the document itself must be an object.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err(format!("game info must be an object, got {}", json_kind(value)));
        };

        let text = |key: &str| {
            map.get(key)
                .and_then(as_text)
                .filter(|s| !s.is_empty())
        };

        let blacklist = match map.get("blacklist") {
            Some(Value::Array(ids)) => ids.iter().filter_map(as_text).collect(),
            _ => HashSet::new(),
        };

        let achievements = match map.get("achievements") {
            Some(Value::Object(schema)) => Some(schema.clone()),
            _ => None,
        };

        Ok(Self {
            name: text("name"),
            icon: text("icon"),
            uses_db: map.get("uses_db").is_some_and(as_flag),
            platform: text("platform"),
            blacklist,
            achievements,
        })
    }

    pub fn is_blacklisted(&self, achievement_id: &str) -> bool {
        self.blacklist.contains(achievement_id)
    }
}

/// One game with its normalized achievements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub achievements: Vec<CanonicalAchievement>,
    pub uses_alternate_store: bool,
    pub platform: Option<String>,
}

impl GameRecord {
    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }

    pub fn total_count(&self) -> usize {
        self.achievements.len()
    }

    /// Rounded completion percentage, 0 for games without achievements.
    pub fn completion_percent(&self) -> u32 {
        calculate_percentage(self.unlocked_count(), self.total_count())
    }

    pub fn is_complete(&self) -> bool {
        self.total_count() > 0 && self.unlocked_count() == self.total_count()
    }

    /// Most recent unlock time, if anything was unlocked with a timestamp.
    pub fn last_unlocked_at(&self) -> Option<i64> {
        self.achievements
            .iter()
            .filter(|a| a.unlocked && a.unlocked_at > 0)
            .map(|a| a.unlocked_at)
            .max()
    }
}

/// Games keyed by id, in discovery order.
///
/// Inserting an id that is already present replaces the record in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameCollection {
    games: IndexMap<String, GameRecord>,
}

impl GameCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite, returning the stored record.
    pub fn upsert(&mut self, record: GameRecord) -> &GameRecord {
        let (index, _) = self.games.insert_full(record.id.clone(), record);
        &self.games[index]
    }

    pub fn get(&self, id: &str) -> Option<&GameRecord> {
        self.games.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.games.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.games.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameRecord> {
        self.games.values()
    }

    pub fn total_unlocked(&self) -> usize {
        self.iter().map(GameRecord::unlocked_count).sum()
    }

    pub fn total_achievements(&self) -> usize {
        self.iter().map(GameRecord::total_count).sum()
    }
}
