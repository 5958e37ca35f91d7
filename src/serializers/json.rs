//! JSON cassette serializer

use super::{is_blank, CassetteDocument, CassetteFile, CodecResult, Serializer};
use crate::interaction::Interaction;

/// Pretty-printed JSON, the default format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn extension(&self) -> &str {
        "json"
    }

    fn serialize(&self, interactions: &[Interaction]) -> CodecResult<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(&CassetteDocument::new(interactions))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn deserialize(&self, bytes: &[u8]) -> CodecResult<Vec<Interaction>> {
        if is_blank(bytes) {
            return Ok(Vec::new());
        }
        let file: CassetteFile = serde_json::from_slice(bytes)?;
        Ok(file.http_interactions)
    }
}
