//! Request/response bodies and their on-disk encoding

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::placeholder::{substitute_bytes, substitute_str, Direction, Placeholder};

/// Encoding tag written alongside text bodies
pub const TEXT_ENCODING: &str = "utf-8";

/// A message body, held either as decoded text or as exact bytes
///
/// Text bodies are written to cassettes as a readable `string`; byte bodies
/// are written as `base64_string` so they round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredBody", into = "StoredBody")]
pub enum Body {
    /// Decoded text
    Text(String),
    /// Exact bytes
    Bytes(Vec<u8>),
}

impl Body {
    /// An empty text body
    #[must_use]
    pub fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Raw bytes of the body
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Consume the body into raw bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Body as text, replacing invalid UTF-8
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    /// Whether the body has no content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Representation used when persisting
    ///
    /// With `exact` the bytes are kept verbatim; otherwise the body is
    /// decoded to text, lossily if it is not valid UTF-8.
    pub(crate) fn for_storage(&self, exact: bool) -> Self {
        if exact {
            Self::Bytes(self.as_bytes().to_vec())
        } else {
            Self::Text(self.text().into_owned())
        }
    }

    pub(crate) fn substitute(&self, placeholders: &[Placeholder], direction: Direction) -> Self {
        match self {
            Self::Text(text) => Self::Text(substitute_str(text, placeholders, direction)),
            Self::Bytes(bytes) => Self::Bytes(substitute_bytes(bytes, placeholders, direction)),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Body {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredBody {
    Base64 {
        #[serde(with = "base64_bytes")]
        base64_string: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encoding: Option<String>,
    },
    Text {
        string: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encoding: Option<String>,
    },
}

impl From<StoredBody> for Body {
    fn from(stored: StoredBody) -> Self {
        match stored {
            StoredBody::Base64 { base64_string, .. } => Self::Bytes(base64_string),
            StoredBody::Text { string, .. } => Self::Text(string),
        }
    }
}

impl From<Body> for StoredBody {
    fn from(body: Body) -> Self {
        match body {
            Body::Bytes(bytes) => Self::Base64 {
                base64_string: bytes,
                encoding: None,
            },
            Body::Text(string) => Self::Text {
                string,
                encoding: Some(TEXT_ENCODING.to_string()),
            },
        }
    }
}

/// Serde helper for base64 encoding/decoding of byte vectors
mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const ENGINE: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use base64::Engine;
        ENGINE.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use base64::Engine;
        let encoded = String::deserialize(deserializer)?;
        ENGINE.decode(&encoded).map_err(serde::de::Error::custom)
    }
}
