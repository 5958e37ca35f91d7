//! File-backed cassettes
//!
//! A cassette is an ordered, append-only list of interactions stored in one
//! file of the library directory. It is loaded when a test asks for it by
//! name and written back on [`Cassette::eject`] if anything changed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::fingerprint::short_id;
use crate::interaction::{Interaction, Request, Response};
use crate::matchers::{MatcherRegistry, MatcherSet};
use crate::options::{CassetteSettings, RecordMode};
use crate::placeholder::{Direction, Placeholder};
use crate::serializers::{Serializer, SerializerRegistry};
use crate::{Result, TapedeckError};

/// Maximum cassette name length in bytes
pub const MAX_NAME_LEN: usize = 255;

/// A named collection of recorded interactions
pub struct Cassette {
    name: String,
    path: PathBuf,
    settings: CassetteSettings,
    matchers: MatcherSet,
    serializer: Arc<dyn Serializer>,
    interactions: Vec<Interaction>,
    recording: bool,
    dirty: bool,
}

impl Cassette {
    /// Load (or start) the cassette `name` in `library_dir`
    ///
    /// A missing file yields an empty cassette. Interactions older than the
    /// re-record interval are cleared before the record mode is applied.
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid, a configured matcher or
    /// serializer is unknown, or the file cannot be read or decoded
    pub fn load(
        name: &str,
        library_dir: &Path,
        settings: CassetteSettings,
        matchers: &MatcherRegistry,
        serializers: &SerializerRegistry,
    ) -> Result<Self> {
        validate_cassette_name(name)?;

        let matcher_set = matchers.resolve(&settings.match_requests_on)?;
        let serializer = serializers.get(&settings.serialize_with)?;
        let path = library_dir.join(format!("{name}.{}", serializer.extension()));

        let interactions = match fs::read(&path) {
            Ok(bytes) => serializer
                .deserialize(&bytes)
                .map_err(|e| invalid_format(&path, &*e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut cassette = Self {
            name: name.to_string(),
            path,
            settings,
            matchers: matcher_set,
            serializer,
            interactions,
            recording: false,
            dirty: false,
        };

        if cassette.needs_re_record(Utc::now()) {
            info!(
                "Cassette '{}' is older than its re-record interval, clearing {} interactions",
                cassette.name,
                cassette.len()
            );
            cassette.clear();
        }

        cassette.recording = match cassette.settings.record {
            RecordMode::All | RecordMode::NewEpisodes => true,
            RecordMode::None => false,
            RecordMode::Once => cassette.is_empty(),
        };

        info!(
            "Loaded cassette '{}' from {} ({} interactions, record mode {}, recording {})",
            cassette.name,
            cassette.path.display(),
            cassette.len(),
            cassette.settings.record,
            cassette.recording
        );

        Ok(cassette)
    }

    /// Cassette name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the cassette is stored in
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved settings
    #[must_use]
    pub fn settings(&self) -> &CassetteSettings {
        &self.settings
    }

    /// Record mode
    #[must_use]
    pub fn record_mode(&self) -> RecordMode {
        self.settings.record
    }

    /// Active matcher names, in order
    #[must_use]
    pub fn match_options(&self) -> Vec<String> {
        self.matchers.names()
    }

    /// Redaction placeholders, in declaration order
    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.settings.placeholders
    }

    /// Whether bodies are stored byte-exact
    #[must_use]
    pub fn preserve_exact_body_bytes(&self) -> bool {
        self.settings.preserve_exact_body_bytes
    }

    /// Recorded interactions, in insertion order
    #[must_use]
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Number of interactions
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Whether the cassette holds no interactions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Whether new interactions may be appended
    ///
    /// Fixed at load time; `once` permits recording only for a cassette
    /// that was empty.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Whether there are changes not yet written to disk
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Oldest `recorded_at`, or [`DateTime::<Utc>::MIN_UTC`] when empty
    #[must_use]
    pub fn earliest_recorded_date(&self) -> DateTime<Utc> {
        self.interactions
            .iter()
            .map(Interaction::recorded_at)
            .min()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// First recorded interaction matching `request`
    ///
    /// The live request is converted to its stored body form and redacted
    /// with the cassette placeholders before comparison, so it is compared
    /// in the same form it would be stored in. Always `None` in `all` mode.
    #[must_use]
    pub fn find_match(&self, request: &Request) -> Option<&Interaction> {
        if self.settings.record == RecordMode::All {
            return None;
        }

        let live = request
            .for_storage(self.settings.preserve_exact_body_bytes)
            .substitute(&self.settings.placeholders, Direction::ToCassette);
        let found = self
            .interactions
            .iter()
            .find(|interaction| self.matchers.matches(&live, interaction.request()));

        debug!(
            "Cassette '{}' {} for {} {} [{}]",
            self.name,
            if found.is_some() { "hit" } else { "miss" },
            request.method,
            request.uri,
            short_id(request)
        );

        found
    }

    /// Replayed response for `request`, if a recorded interaction matches
    #[must_use]
    pub fn replay(&self, request: &Request) -> Option<Response> {
        self.find_match(request)
            .map(|interaction| interaction.as_response(&self.settings.placeholders))
    }

    /// Append a live exchange and return the stored interaction
    ///
    /// # Errors
    ///
    /// Returns error if the cassette does not permit recording
    pub fn save_interaction(&mut self, response: &Response, request: &Request) -> Result<&Interaction> {
        if !self.recording {
            return Err(TapedeckError::RecordingNotPermitted {
                cassette: self.name.clone(),
                record_mode: self.settings.record,
            });
        }

        let interaction = Interaction::capture(
            request,
            response,
            self.settings.preserve_exact_body_bytes,
            &self.settings.placeholders,
        );

        let index = self.interactions.len();
        self.interactions.push(interaction);
        self.dirty = true;

        debug!(
            "Cassette '{}' recorded {} {} -> {} [{}]",
            self.name,
            request.method,
            request.uri,
            response.status_code(),
            short_id(request)
        );

        Ok(&self.interactions[index])
    }

    /// Remove every interaction
    pub fn clear(&mut self) {
        if !self.interactions.is_empty() {
            self.interactions.clear();
            self.dirty = true;
        }
    }

    /// Write the cassette to disk if it changed
    ///
    /// # Errors
    ///
    /// Returns error if encoding or writing fails
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = self
            .serializer
            .serialize(&self.interactions)
            .map_err(|e| invalid_format(&self.path, &*e))?;
        fs::write(&self.path, bytes)?;
        self.dirty = false;

        info!(
            "Wrote {} interactions to {}",
            self.interactions.len(),
            self.path.display()
        );

        Ok(())
    }

    /// Flush and release the cassette
    ///
    /// # Errors
    ///
    /// Returns error if flushing fails
    pub fn eject(mut self) -> Result<()> {
        self.flush()?;
        info!("Ejected cassette '{}'", self.name);
        Ok(())
    }

    fn needs_re_record(&self, now: DateTime<Utc>) -> bool {
        match self.settings.re_record_after() {
            Some(interval) if !self.is_empty() => {
                now.signed_duration_since(self.earliest_recorded_date()) > interval
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for Cassette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cassette")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("record_mode", &self.settings.record)
            .field("match_options", &self.matchers)
            .field("interactions", &self.interactions.len())
            .field("recording", &self.recording)
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn invalid_format(path: &Path, error: &(dyn std::error::Error + Send + Sync)) -> TapedeckError {
    TapedeckError::InvalidFormat {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

/// Validate a cassette name
///
/// # Errors
///
/// Returns error if the name is empty, too long, or could escape the
/// library directory
pub fn validate_cassette_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TapedeckError::InvalidCassetteName(
            "Cassette name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(TapedeckError::InvalidCassetteName(format!(
            "Cassette name too long: {} > {MAX_NAME_LEN}",
            name.len()
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(TapedeckError::InvalidCassetteName(
            "Cassette name cannot contain path separators".to_string(),
        ));
    }

    if name.starts_with('.') {
        return Err(TapedeckError::InvalidCassetteName(
            "Cassette name cannot start with dot".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(TapedeckError::InvalidCassetteName(
            "Cassette name cannot contain null bytes".to_string(),
        ));
    }

    Ok(())
}
