//! Placeholder substitution for keeping secrets out of cassette files
//!
//! A placeholder pairs a token with the literal it stands for. Interactions
//! going to a cassette have every literal swapped for its token; interactions
//! replayed from a cassette get the reverse treatment. Substitutions run in
//! declaration order and are purely textual.

use serde::{Deserialize, Serialize};

/// A `{placeholder, replace}` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Placeholder {
    /// Token written to the cassette
    pub placeholder: String,
    /// Literal value seen by live code
    pub replace: String,
}

impl Placeholder {
    /// Create a new placeholder
    pub fn new(placeholder: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            replace: replace.into(),
        }
    }

    fn pair(&self, direction: Direction) -> (&str, &str) {
        match direction {
            Direction::ToCassette => (&self.replace, &self.placeholder),
            Direction::FromCassette => (&self.placeholder, &self.replace),
        }
    }
}

/// Which way a substitution runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Literal to token, applied when saving
    ToCassette,
    /// Token to literal, applied when replaying
    FromCassette,
}

/// Apply every placeholder to a string
#[must_use]
pub fn substitute_str(text: &str, placeholders: &[Placeholder], direction: Direction) -> String {
    let mut out = text.to_string();
    for placeholder in placeholders {
        let (from, to) = placeholder.pair(direction);
        // An empty needle would match between every character.
        if from.is_empty() || !out.contains(from) {
            continue;
        }
        out = out.replace(from, to);
    }
    out
}

/// Apply every placeholder to raw bytes
#[must_use]
pub fn substitute_bytes(bytes: &[u8], placeholders: &[Placeholder], direction: Direction) -> Vec<u8> {
    let mut out = bytes.to_vec();
    for placeholder in placeholders {
        let (from, to) = placeholder.pair(direction);
        if from.is_empty() {
            continue;
        }
        out = replace_bytes(&out, from.as_bytes(), to.as_bytes());
    }
    out
}

fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;

    while let Some(pos) = find(rest, from) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(to);
        rest = &rest[pos + from.len()..];
    }

    out.extend_from_slice(rest);
    out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
