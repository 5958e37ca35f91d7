//! Transport boundary between a session and the network

mod http;

pub use http::HttpTransport;

use std::fmt;
use std::sync::Arc;

use crate::interaction::{Request, Response};
use crate::Result;

/// Default per-request timeout for the real HTTP transport
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// URL prefixes every session scope is expected to cover
pub const DEFAULT_PREFIXES: [&str; 2] = ["http://", "https://"];

/// Sends a request and produces a response
pub trait Transport: Send + Sync {
    /// Perform one request
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be completed
    fn send(&self, request: &Request) -> Result<Response>;

    /// Release pooled connections
    fn close(&self) {}
}

/// URL-prefix to transport table
///
/// Prefixes are stored lowercased; dispatch picks the longest prefix that
/// the lowercased URL starts with.
#[derive(Clone, Default)]
pub struct Mounts {
    entries: Vec<(String, Arc<dyn Transport>)>,
}

impl Mounts {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `transport` under `prefix`, replacing any previous mount
    pub fn mount(&mut self, prefix: impl Into<String>, transport: Arc<dyn Transport>) {
        let prefix = prefix.into().to_lowercase();
        match self.entries.iter_mut().find(|(existing, _)| *existing == prefix) {
            Some(entry) => entry.1 = transport,
            None => self.entries.push((prefix, transport)),
        }
    }

    /// Transport with the longest prefix matching `url`
    #[must_use]
    pub fn select(&self, url: &str) -> Option<&Arc<dyn Transport>> {
        let url = url.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, transport)| transport)
    }

    /// Mounted prefixes, in mount order
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(prefix, _)| prefix.as_str())
    }

    /// Prefix/transport pairs, in mount order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Transport>)> {
        self.entries
            .iter()
            .map(|(prefix, transport)| (prefix.as_str(), transport))
    }

    /// Number of mounts
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is mounted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close every distinct mounted transport once
    pub fn close_all(&self) {
        let mut closed: Vec<*const ()> = Vec::with_capacity(self.entries.len());
        for (_, transport) in &self.entries {
            let ptr = Arc::as_ptr(transport).cast::<()>();
            if !closed.contains(&ptr) {
                closed.push(ptr);
                transport.close();
            }
        }
    }
}

impl fmt::Debug for Mounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.prefixes()).finish()
    }
}
