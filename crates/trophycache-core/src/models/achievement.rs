//! Achievement payload shapes and the canonical achievement record.
//!
//! Progress files have been produced by several tools over the years, each
//! with its own field names. Shape detection lives in
//! [`RawAchievements::detect`]; field names are resolved through the
//! [`ACHIEVEMENT_FIELDS`] alias table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::manifest::json_kind;

/// Candidate keys for each canonical field, highest priority first.
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub name: &'static [&'static str],
    pub description: &'static [&'static str],
    pub icon: &'static [&'static str],
    pub icongray: &'static [&'static str],
    pub hidden: &'static [&'static str],
    pub rarity: &'static [&'static str],
    pub unlocked: &'static [&'static str],
    pub unlocked_at: &'static [&'static str],
}

pub const ACHIEVEMENT_FIELDS: AliasTable = AliasTable {
    name: &["name", "displayName"],
    description: &["description", "desc"],
    icon: &["icon"],
    icongray: &["icon_gray", "icongray", "icon"],
    hidden: &["hidden"],
    rarity: &["percent"],
    unlocked: &["earned", "unlocked", "achieved"],
    unlocked_at: &["earned_time", "unlock_time", "unlocktime"],
};

/// Key carrying the achievement id in the list shape.
const LIST_ID_KEY: &str = "apiname";

/// Key under which some tools nest the whole payload.
const WRAPPER_KEY: &str = "achievements";

/// A single entry of an achievements payload, keyed by field name.
pub type RawEntry = Map<String, Value>;

/// Detected achievements payload shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAchievements {
    /// `[{ "apiname": "A1", "achieved": 1, "unlocktime": 1000 }, ...]`
    List(Vec<Value>),
    /// `{ "A1": { "earned": true, "earned_time": 1000, ... }, ... }`
    Keyed(Map<String, Value>),
}

impl RawAchievements {
    /// Classify a payload. Unwraps one level of `{ "achievements": ... }`.
    pub fn detect(payload: &Value) -> Result<Self, String> {
        match payload.get(WRAPPER_KEY) {
            Some(inner) if inner.is_array() || inner.is_object() => Self::detect_unwrapped(inner),
            _ => Self::detect_unwrapped(payload),
        }
    }

    fn detect_unwrapped(payload: &Value) -> Result<Self, String> {
        match payload {
            Value::Array(items) => Ok(RawAchievements::List(items.clone())),
            Value::Object(map) => Ok(RawAchievements::Keyed(map.clone())),
            other => Err(format!(
                "achievements payload must be a list or an object, got {}",
                json_kind(other)
            )),
        }
    }

    /// Flatten into id → entry, preserving document order.
    ///
    /// List entries without an `apiname` are dropped. Keyed entries that are
    /// not objects become empty entries (no metadata, no progress).
    pub fn into_entries(self) -> IndexMap<String, RawEntry> {
        match self {
            RawAchievements::List(items) => {
                let mut entries = IndexMap::with_capacity(items.len());
                for item in items {
                    let Value::Object(entry) = item else {
                        debug!("Skipping non-object achievement list entry");
                        continue;
                    };
                    let Some(id) = entry.get(LIST_ID_KEY).and_then(as_text) else {
                        debug!("Skipping achievement list entry without apiname");
                        continue;
                    };
                    // Later duplicates win but keep the first position
                    entries.insert(id, entry);
                }
                entries
            }
            RawAchievements::Keyed(map) => map
                .into_iter()
                .map(|(id, value)| match value {
                    Value::Object(entry) => (id, entry),
                    _ => (id, RawEntry::new()),
                })
                .collect(),
        }
    }
}

/// The single normalized achievement shape handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CanonicalAchievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub hidden: bool,
    pub icon: String,
    pub icongray: String,
    pub unlocked: bool,
    /// Unix seconds, 0 if never unlocked
    pub unlocked_at: i64,
    pub rarity: Option<f64>,
}

impl CanonicalAchievement {
    /// Build an achievement from its metadata entry and optional progress
    /// entry. When a payload carries both, pass the same entry twice.
    pub fn resolve(id: &str, metadata: &RawEntry, progress: Option<&RawEntry>) -> Self {
        let fields = &ACHIEVEMENT_FIELDS;
        let text = |keys: &[&str]| first_present(metadata, keys).and_then(as_text);

        let (unlocked, unlocked_at) = match progress {
            Some(entry) => (
                first_present(entry, fields.unlocked).map(as_flag).unwrap_or(false),
                first_present(entry, fields.unlocked_at)
                    .map(as_unix_seconds)
                    .unwrap_or(0),
            ),
            None => (false, 0),
        };

        Self {
            id: id.to_string(),
            name: text(fields.name).unwrap_or_else(|| id.to_string()),
            description: text(fields.description).unwrap_or_default(),
            hidden: first_present(metadata, fields.hidden).map(as_flag).unwrap_or(false),
            icon: text(fields.icon).unwrap_or_default(),
            icongray: text(fields.icongray).unwrap_or_default(),
            unlocked,
            unlocked_at,
            rarity: first_present(metadata, fields.rarity).and_then(as_number),
        }
    }
}

/// First alias present in the entry. `null` counts as absent.
pub fn first_present<'a>(entry: &'a RawEntry, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| entry.get(*key).filter(|value| !value.is_null()))
}

pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Truthiness for the flag encodings seen in the wild: `true`, `1`, `"1"`, `"true"`.
pub fn as_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

pub fn as_unix_seconds(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().map(|f| f as i64).unwrap_or(0),
        _ => 0,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
