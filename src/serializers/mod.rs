//! Cassette serializers
//!
//! A serializer turns the ordered interactions of a cassette into file bytes
//! and back. The file extension of a cassette comes from its serializer.

mod json;
mod yaml;

pub use json::JsonSerializer;
pub use yaml::YamlSerializer;

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::interaction::Interaction;
use crate::{Result, TapedeckError};

/// Identifies the producer of a cassette file
pub const RECORDED_WITH: &str = concat!("tapedeck/", env!("CARGO_PKG_VERSION"));

/// Result type for serializer implementations
pub type CodecResult<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

/// Converts cassette interactions to and from bytes
pub trait Serializer: Send + Sync {
    /// File extension, without the leading dot
    fn extension(&self) -> &str;

    /// Encode interactions in order
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails
    fn serialize(&self, interactions: &[Interaction]) -> CodecResult<Vec<u8>>;

    /// Decode interactions in order; empty input is an empty cassette
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid cassette
    fn deserialize(&self, bytes: &[u8]) -> CodecResult<Vec<Interaction>>;
}

/// Document written by the built-in serializers
#[derive(Debug, Serialize)]
pub(crate) struct CassetteDocument<'a> {
    pub http_interactions: &'a [Interaction],
    pub recorded_with: &'a str,
}

impl<'a> CassetteDocument<'a> {
    pub(crate) fn new(interactions: &'a [Interaction]) -> Self {
        Self {
            http_interactions: interactions,
            recorded_with: RECORDED_WITH,
        }
    }
}

/// Owned form of [`CassetteDocument`] for reading
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CassetteFile {
    #[serde(default)]
    pub http_interactions: Vec<Interaction>,
    #[serde(default)]
    #[allow(dead_code)]
    pub recorded_with: String,
}

/// Whether the bytes hold nothing but whitespace
pub(crate) fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Name to serializer lookup table
///
/// [`Default`] registers `json` and `yaml`.
#[derive(Clone)]
pub struct SerializerRegistry {
    serializers: BTreeMap<String, Arc<dyn Serializer>>,
}

impl SerializerRegistry {
    /// Registry with no serializers
    #[must_use]
    pub fn empty() -> Self {
        Self {
            serializers: BTreeMap::new(),
        }
    }

    /// Register (or replace) a serializer under `name`
    pub fn register(&mut self, name: impl Into<String>, serializer: impl Serializer + 'static) {
        self.serializers.insert(name.into(), Arc::new(serializer));
    }

    /// Look up a serializer
    ///
    /// # Errors
    ///
    /// Returns error if no serializer is registered under `name`
    pub fn get(&self, name: &str) -> Result<Arc<dyn Serializer>> {
        self.serializers
            .get(name)
            .cloned()
            .ok_or_else(|| TapedeckError::UnknownSerializer(name.to_string()))
    }

    /// Whether a serializer is registered under `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.serializers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.serializers.keys().map(String::as_str)
    }

    /// Find the serializer owning a file extension
    #[must_use]
    pub fn for_extension(&self, extension: &str) -> Option<Arc<dyn Serializer>> {
        self.serializers
            .values()
            .find(|serializer| serializer.extension().eq_ignore_ascii_case(extension))
            .cloned()
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("json", JsonSerializer);
        registry.register("yaml", YamlSerializer);
        registry
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
