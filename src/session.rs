//! Client session with URL-prefix transport mounts

use std::sync::Arc;

use tracing::debug;

use crate::interaction::{Request, Response};
use crate::transport::{HttpTransport, Mounts, Transport};
use crate::{Result, TapedeckError};

/// An HTTP client session
///
/// Every request is dispatched to the transport mounted under the longest
/// prefix of its URL.
#[derive(Debug, Default)]
pub struct Session {
    mounts: Mounts,
}

impl Session {
    /// Session with nothing mounted
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with a real [`HttpTransport`] mounted for `http://`
    ///
    /// # Errors
    ///
    /// Returns error if the transport cannot be created
    pub fn with_http() -> Result<Self> {
        let mut session = Self::new();
        session.mount("http://", Arc::new(HttpTransport::new()?));
        Ok(session)
    }

    /// Mount `transport` for every URL starting with `prefix`
    pub fn mount(&mut self, prefix: impl Into<String>, transport: Arc<dyn Transport>) {
        self.mounts.mount(prefix, transport);
    }

    /// Current mount table
    #[must_use]
    pub fn mounts(&self) -> &Mounts {
        &self.mounts
    }

    /// Swap in a whole mount table, returning the previous one
    pub fn replace_mounts(&mut self, mounts: Mounts) -> Mounts {
        std::mem::replace(&mut self.mounts, mounts)
    }

    /// Send a request through the matching transport
    ///
    /// # Errors
    ///
    /// Returns error if no transport is mounted for the URL, or the
    /// transport fails
    pub fn send(&self, request: &Request) -> Result<Response> {
        let transport = self
            .mounts
            .select(&request.uri)
            .ok_or_else(|| TapedeckError::NoTransport(request.uri.clone()))?;

        debug!("Dispatching {} {}", request.method, request.uri);
        transport.send(request)
    }

    /// Send a GET request
    ///
    /// # Errors
    ///
    /// See [`Session::send`]
    pub fn get(&self, url: &str) -> Result<Response> {
        self.send(&Request::get(url))
    }

    /// Close every mounted transport
    pub fn close(&self) {
        self.mounts.close_all();
    }
}
