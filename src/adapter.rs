//! Interception adapter
//!
//! Mounted in place of a session's transports while a recorder is running.
//! Each request is replayed from the loaded cassette, recorded through the
//! preserved original transport, or rejected.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::cassette::Cassette;
use crate::fingerprint::short_id;
use crate::interaction::{Request, Response};
use crate::transport::{Mounts, Transport};
use crate::{Result, TapedeckError};

/// Transport that serves requests from a cassette
#[derive(Debug)]
pub struct InterceptionAdapter {
    cassette: Mutex<Option<Cassette>>,
    originals: Mounts,
}

impl InterceptionAdapter {
    /// Create an adapter delegating live calls to `originals`
    #[must_use]
    pub fn new(originals: Mounts) -> Self {
        Self {
            cassette: Mutex::new(None),
            originals,
        }
    }

    /// Preserved original transports
    #[must_use]
    pub fn originals(&self) -> &Mounts {
        &self.originals
    }

    /// Load a cassette, ejecting any previous one first
    ///
    /// # Errors
    ///
    /// Returns error if the previous cassette cannot be written
    pub fn load_cassette(&self, cassette: Cassette) -> Result<()> {
        let mut slot = self.lock();
        if let Some(previous) = slot.take() {
            previous.eject()?;
        }
        *slot = Some(cassette);
        Ok(())
    }

    /// Eject the loaded cassette, writing it if it changed
    ///
    /// # Errors
    ///
    /// Returns error if the cassette cannot be written
    pub fn eject_cassette(&self) -> Result<()> {
        match self.lock().take() {
            Some(cassette) => cassette.eject(),
            None => Ok(()),
        }
    }

    /// Whether a cassette is loaded
    #[must_use]
    pub fn has_cassette(&self) -> bool {
        self.lock().is_some()
    }

    /// Run `f` against the loaded cassette
    pub fn with_cassette<R>(&self, f: impl FnOnce(&Cassette) -> R) -> Option<R> {
        self.lock().as_ref().map(f)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Cassette>> {
        self.cassette.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send_live(&self, request: &Request) -> Result<Response> {
        let transport = self
            .originals
            .select(&request.uri)
            .ok_or_else(|| TapedeckError::NoTransport(request.uri.clone()))?;

        let mut response = transport.send(request)?;
        if response.url.is_empty() {
            response.url.clone_from(&request.uri);
        }
        Ok(response)
    }
}

impl Transport for InterceptionAdapter {
    fn send(&self, request: &Request) -> Result<Response> {
        let mut slot = self.lock();
        let cassette = slot.as_mut().ok_or(TapedeckError::NoCassette)?;

        if let Some(response) = cassette.replay(request) {
            debug!("Replaying {} {} [{}]", request.method, request.uri, short_id(request));
            return Ok(response);
        }

        if cassette.is_recording() {
            debug!("Recording {} {} [{}]", request.method, request.uri, short_id(request));
            let live = self.send_live(request)?;
            let placeholders = cassette.placeholders().to_vec();
            let interaction = cassette.save_interaction(&live, request)?;
            return Ok(interaction.as_response(&placeholders));
        }

        Err(TapedeckError::UnhandledRequest {
            url: request.uri.clone(),
            cassette_path: cassette.path().display().to_string(),
            record_mode: cassette.record_mode(),
            match_options: cassette.match_options(),
        })
    }

    fn close(&self) {
        self.originals.close_all();
    }
}
