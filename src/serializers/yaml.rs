//! YAML cassette serializer

use super::{is_blank, CassetteDocument, CassetteFile, CodecResult, Serializer};
use crate::interaction::Interaction;

/// YAML documents, easier to hand-edit
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSerializer;

impl Serializer for YamlSerializer {
    fn extension(&self) -> &str {
        "yaml"
    }

    fn serialize(&self, interactions: &[Interaction]) -> CodecResult<Vec<u8>> {
        let yaml = serde_yaml::to_string(&CassetteDocument::new(interactions))?;
        Ok(yaml.into_bytes())
    }

    fn deserialize(&self, bytes: &[u8]) -> CodecResult<Vec<Interaction>> {
        if is_blank(bytes) {
            return Ok(Vec::new());
        }
        let file: CassetteFile = serde_yaml::from_slice(bytes)?;
        Ok(file.http_interactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Request, Response};
    use chrono::Utc;

    #[test]
    fn test_round_trip_with_binary_body() {
        let interactions = vec![Interaction::new(
            Request::post("https://example.test/upload", vec![0u8, 1, 2, 255]),
            Response::new(201).with_header("Location", "/upload/1"),
            Utc::now(),
        )];

        let bytes = YamlSerializer.serialize(&interactions).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("base64_string"));

        let back = YamlSerializer.deserialize(&bytes).unwrap();
        assert_eq!(back, interactions);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(YamlSerializer.deserialize(b"http_interactions: [unclosed").is_err());
    }
}
