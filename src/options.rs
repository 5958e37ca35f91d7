//! Per-use cassette options with validation and default fallback
//!
//! Options arrive as a loose key/value mapping. [`Options::validate`] drops
//! every unknown key and every value that fails its key's validator, so an
//! invalid value behaves exactly as if it had never been supplied. What
//! remains is overlaid on the defaults from [`Config`](crate::config::Config)
//! by [`Options::resolve`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::matchers::MatcherRegistry;
use crate::placeholder::Placeholder;
use crate::serializers::SerializerRegistry;
use crate::TapedeckError;

/// Key: ordered list of matcher names
pub const MATCH_REQUESTS_ON: &str = "match_requests_on";
/// Key: record mode
pub const RECORD: &str = "record";
/// Key: serializer name
pub const SERIALIZE_WITH: &str = "serialize_with";
/// Key: maximum cassette age in days before re-recording
pub const RE_RECORD_INTERVAL: &str = "re_record_interval";
/// Key: store bodies byte-exact
pub const PRESERVE_EXACT_BODY_BYTES: &str = "preserve_exact_body_bytes";
/// Key: placeholder list
pub const PLACEHOLDERS: &str = "placeholders";

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Policy deciding whether new interactions may be appended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    /// Always perform and record, never replay
    All,
    /// Replay hits, record misses
    NewEpisodes,
    /// Replay only
    None,
    /// Record if the cassette is empty, otherwise replay only
    #[default]
    Once,
}

impl RecordMode {
    /// Every record mode
    pub const ALL_MODES: [RecordMode; 4] = [
        RecordMode::All,
        RecordMode::NewEpisodes,
        RecordMode::None,
        RecordMode::Once,
    ];

    /// Name used in options and config files
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordMode::All => "all",
            RecordMode::NewEpisodes => "new_episodes",
            RecordMode::None => "none",
            RecordMode::Once => "once",
        }
    }
}

impl fmt::Display for RecordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordMode {
    type Err = TapedeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_MODES
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| TapedeckError::ConfigError(format!("Unknown record mode: {s}")))
    }
}

/// Fully resolved settings for one cassette
///
/// The [`Default`] impl is the static default table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CassetteSettings {
    /// Matchers combined with AND, in order
    pub match_requests_on: Vec<String>,
    /// Record mode
    pub record: RecordMode,
    /// Serializer name
    pub serialize_with: String,
    /// Maximum cassette age in days before it is cleared on load
    pub re_record_interval: Option<f64>,
    /// Store bodies byte-exact instead of as readable text
    pub preserve_exact_body_bytes: bool,
    /// Redaction placeholders, applied in order
    pub placeholders: Vec<Placeholder>,
}

impl Default for CassetteSettings {
    fn default() -> Self {
        Self {
            match_requests_on: vec!["method".to_string(), "uri".to_string()],
            record: RecordMode::Once,
            serialize_with: "json".to_string(),
            re_record_interval: None,
            preserve_exact_body_bytes: false,
            placeholders: Vec::new(),
        }
    }
}

impl CassetteSettings {
    /// Re-record interval as a duration, if one is set
    #[must_use]
    pub fn re_record_after(&self) -> Option<chrono::Duration> {
        let days = self.re_record_interval?;
        if !days.is_finite() || days <= 0.0 {
            return None;
        }
        Some(chrono::Duration::milliseconds((days * MILLIS_PER_DAY) as i64))
    }
}

/// Validated key/value overlay on top of [`CassetteSettings`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    data: BTreeMap<String, Value>,
}

impl Options {
    /// Empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object; anything else yields empty options
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                data: map.into_iter().collect(),
            },
            other => {
                warn!("Ignoring cassette options that are not a mapping: {other}");
                Self::default()
            }
        }
    }

    /// Set a raw option value
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Whether a key was explicitly supplied (and survived validation)
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Explicit value for a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Explicitly supplied keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Drop unknown keys and invalid values
    pub fn validate(&mut self, matchers: &MatcherRegistry, serializers: &SerializerRegistry) {
        self.data.retain(|key, value| {
            let valid = match key.as_str() {
                MATCH_REQUESTS_ON => valid_matchers(value, matchers),
                RECORD => value.as_str().is_some_and(|s| s.parse::<RecordMode>().is_ok()),
                SERIALIZE_WITH => value.as_str().is_some_and(|s| serializers.contains(s)),
                RE_RECORD_INTERVAL => {
                    value.is_null() || value.as_f64().is_some_and(|n| n.is_finite() && n > 0.0)
                }
                PRESERVE_EXACT_BODY_BYTES => value.is_boolean(),
                PLACEHOLDERS => valid_placeholders(value),
                _ => {
                    warn!("Discarding unknown cassette option '{key}'");
                    return false;
                }
            };
            if !valid {
                warn!("Discarding invalid value for cassette option '{key}': {value}");
            }
            valid
        });
    }

    /// Overlay explicit values on `defaults`
    ///
    /// Values that cannot be interpreted fall back to the default, so this is
    /// safe to call on unvalidated options too.
    #[must_use]
    pub fn resolve(&self, defaults: &CassetteSettings) -> CassetteSettings {
        let mut settings = defaults.clone();

        if let Some(names) = self.typed::<Vec<String>>(MATCH_REQUESTS_ON) {
            settings.match_requests_on = names;
        }
        if let Some(mode) = self
            .get(RECORD)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
        {
            settings.record = mode;
        }
        if let Some(name) = self.typed::<String>(SERIALIZE_WITH) {
            settings.serialize_with = name;
        }
        if let Some(value) = self.get(RE_RECORD_INTERVAL) {
            settings.re_record_interval = value.as_f64();
        }
        if let Some(flag) = self.get(PRESERVE_EXACT_BODY_BYTES).and_then(Value::as_bool) {
            settings.preserve_exact_body_bytes = flag;
        }
        if let Some(placeholders) = self.typed::<Vec<Placeholder>>(PLACEHOLDERS) {
            settings.placeholders = placeholders;
        }

        settings
    }

    fn typed<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

fn valid_matchers(value: &Value, matchers: &MatcherRegistry) -> bool {
    value.as_array().is_some_and(|names| {
        names
            .iter()
            .all(|name| name.as_str().is_some_and(|n| matchers.contains(n)))
    })
}

fn valid_placeholders(value: &Value) -> bool {
    value.as_array().is_some_and(|items| {
        items.iter().all(|item| {
            item.as_object().is_some_and(|entry| {
                entry.len() == 2
                    && entry.get("placeholder").is_some_and(Value::is_string)
                    && entry.get("replace").is_some_and(Value::is_string)
            })
        })
    })
}
