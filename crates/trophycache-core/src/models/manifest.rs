//! Consolidated manifest (`game-data.json`) types.
//!
//! The manifest has shipped in two shapes over time: a bare list of game
//! descriptors, and an object wrapping that list together with a
//! `last_updated` timestamp. Shape detection happens once, in
//! [`ManifestShape::detect`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoadError;

/// Opaque token telling whether remote data changed since the last fetch.
///
/// Holds the raw `last_updated` field rendered as a string, so that
/// `1700000000` and `"1700000000"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FreshnessMarker(String);

impl FreshnessMarker {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Read a marker from the manifest field. Null, empty and non-scalar
    /// values mean the manifest is unversioned.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the marker as unix seconds.
    pub fn as_timestamp(&self) -> Option<i64> {
        let raw = self.0.trim();
        raw.parse::<i64>().ok().or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f as i64)
        })
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        self.as_timestamp()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

impl fmt::Display for FreshnessMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One game entry in the manifest.
///
/// Every field stays as raw JSON and any entry deserializes, even `null` or
/// a bare string (yielding a null `appid`). Shapes are checked per game by
/// the aggregator so a single malformed game cannot poison the whole
/// manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct GameDescriptor {
    pub appid: Value,
    pub achievements: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

impl From<Value> for GameDescriptor {
    fn from(entry: Value) -> Self {
        let mut fields = match entry {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        GameDescriptor {
            appid: fields.remove("appid").unwrap_or(Value::Null),
            achievements: fields.remove("achievements").unwrap_or(Value::Null),
            info: fields.remove("info").filter(|info| !info.is_null()),
        }
    }
}

impl GameDescriptor {
    /// The game id as a string. Numeric and string appids are equivalent.
    pub fn id(&self) -> String {
        match &self.appid {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// The full list of games as served by the manifest, and as cached locally.
pub type Dataset = Vec<GameDescriptor>;

/// Detected manifest shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestShape {
    /// Legacy bare list. Caching is disabled for this shape.
    Unversioned(Dataset),
    /// `{ "games": [...], "last_updated": ... }`
    Versioned {
        games: Dataset,
        last_updated: Option<FreshnessMarker>,
    },
}

impl ManifestShape {
    pub fn detect(document: Value) -> Result<Self, LoadError> {
        match document {
            Value::Array(items) => Ok(ManifestShape::Unversioned(parse_games(items))),
            Value::Object(mut map) => match map.remove("games") {
                Some(Value::Array(items)) => Ok(ManifestShape::Versioned {
                    games: parse_games(items),
                    last_updated: map.get("last_updated").and_then(FreshnessMarker::from_json),
                }),
                _ => Err(LoadError::Format(
                    "game-data.json object has no `games` list".to_string(),
                )),
            },
            other => Err(LoadError::Format(format!(
                "game-data.json must be a list or an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn is_versioned(&self) -> bool {
        matches!(self, ManifestShape::Versioned { .. })
    }

    /// The marker usable for cache decisions, if any.
    pub fn marker(&self) -> Option<&FreshnessMarker> {
        match self {
            ManifestShape::Unversioned(_) => None,
            ManifestShape::Versioned { last_updated, .. } => last_updated.as_ref(),
        }
    }

    pub fn into_games(self) -> Dataset {
        match self {
            ManifestShape::Unversioned(games) | ManifestShape::Versioned { games, .. } => games,
        }
    }
}

fn parse_games(items: Vec<Value>) -> Dataset {
    items.into_iter().map(GameDescriptor::from).collect()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
