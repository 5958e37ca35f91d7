//! Session controller
//!
//! A [`Recorder`] borrows a [`Session`], swaps its transports for an
//! [`InterceptionAdapter`] and restores them when stopped or dropped.

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::InterceptionAdapter;
use crate::cassette::Cassette;
use crate::config::Config;
use crate::matchers::{Matcher, MatcherRegistry};
use crate::options::Options;
use crate::serializers::{Serializer, SerializerRegistry};
use crate::session::Session;
use crate::transport::{Mounts, Transport, DEFAULT_PREFIXES};
use crate::{Result, TapedeckError};

/// Installs cassette interception on a session
pub struct Recorder<'s> {
    session: &'s mut Session,
    originals: Mounts,
    adapter: Arc<InterceptionAdapter>,
    config: Config,
    matchers: MatcherRegistry,
    serializers: SerializerRegistry,
    started: bool,
}

impl<'s> Recorder<'s> {
    /// Create a recorder with the built-in matchers and serializers
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn new(session: &'s mut Session, config: Config) -> Result<Self> {
        Self::with_registries(
            session,
            config,
            MatcherRegistry::default(),
            SerializerRegistry::default(),
        )
    }

    /// Create a recorder with prebuilt registries
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or its default
    /// settings name an unregistered matcher or serializer
    pub fn with_registries(
        session: &'s mut Session,
        config: Config,
        matchers: MatcherRegistry,
        serializers: SerializerRegistry,
    ) -> Result<Self> {
        config.validate()?;

        let defaults = &config.default_cassette_options;
        if let Some(name) = defaults
            .match_requests_on
            .iter()
            .find(|name| !matchers.contains(name))
        {
            return Err(TapedeckError::ConfigError(format!(
                "Default matcher '{name}' is not registered"
            )));
        }
        if !serializers.contains(&defaults.serialize_with) {
            return Err(TapedeckError::ConfigError(format!(
                "Default serializer '{}' is not registered",
                defaults.serialize_with
            )));
        }

        let originals = session.mounts().clone();
        let adapter = Arc::new(InterceptionAdapter::new(originals.clone()));

        Ok(Self {
            session,
            originals,
            adapter,
            config,
            matchers,
            serializers,
            started: false,
        })
    }

    /// Register a custom matcher for subsequent cassettes
    pub fn register_matcher(&mut self, name: impl Into<String>, matcher: impl Matcher + 'static) {
        self.matchers.register(name, matcher);
    }

    /// Register a custom serializer for subsequent cassettes
    pub fn register_serializer(
        &mut self,
        name: impl Into<String>,
        serializer: impl Serializer + 'static,
    ) {
        self.serializers.register(name, serializer);
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The controlled session
    #[must_use]
    pub fn session(&self) -> &Session {
        &*self.session
    }

    /// Whether interception is installed
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Load the cassette `name` and start intercepting
    ///
    /// Invalid option values are discarded and replaced by the defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the cassette cannot be loaded or the previous one
    /// cannot be written
    pub fn use_cassette(&mut self, name: &str, options: Options) -> Result<&mut Self> {
        let mut options = options;
        options.validate(&self.matchers, &self.serializers);
        let settings = options.resolve(&self.config.default_cassette_options);

        let cassette = Cassette::load(
            name,
            &self.config.cassette_library_dir,
            settings,
            &self.matchers,
            &self.serializers,
        )?;
        self.adapter.load_cassette(cassette)?;

        if !self.started {
            self.start();
        }
        Ok(self)
    }

    /// Mount the adapter over every original prefix and the default schemes
    pub fn start(&mut self) {
        if self.started {
            return;
        }

        let adapter: Arc<dyn Transport> = self.adapter.clone();
        let mut intercepting = Mounts::new();
        for prefix in DEFAULT_PREFIXES {
            intercepting.mount(prefix, Arc::clone(&adapter));
        }
        for prefix in self.originals.prefixes() {
            intercepting.mount(prefix, Arc::clone(&adapter));
        }

        self.session.replace_mounts(intercepting);
        self.started = true;
        info!("Recorder started");
    }

    /// Eject the cassette and restore the original transports
    ///
    /// The transports are restored even if writing the cassette fails.
    ///
    /// # Errors
    ///
    /// Returns error if the cassette cannot be written
    pub fn stop(&mut self) -> Result<()> {
        if !self.started {
            return self.adapter.eject_cassette();
        }

        let ejected = self.adapter.eject_cassette();
        self.session.replace_mounts(self.originals.clone());
        self.started = false;
        info!("Recorder stopped");

        ejected
    }

    /// Run `f` against the loaded cassette
    pub fn current_cassette<R>(&self, f: impl FnOnce(&Cassette) -> R) -> Option<R> {
        self.adapter.with_cassette(f)
    }
}

impl Drop for Recorder<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop recorder cleanly: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Request, Response};
    use crate::options::RecordMode;
    use serde_json::json;
    use tempfile::TempDir;

    struct Ok200;

    impl Transport for Ok200 {
        fn send(&self, _request: &Request) -> Result<Response> {
            Ok(Response::new(200).with_body("live"))
        }
    }

    fn session() -> Session {
        let mut session = Session::new();
        session.mount("https://", Arc::new(Ok200));
        session
    }

    fn config(dir: &TempDir) -> Config {
        Config::default().with_library_dir(dir.path())
    }

    #[test]
    fn test_use_cassette_starts_interception() {
        let dir = TempDir::new().unwrap();
        let mut session = session();
        let mut recorder = Recorder::new(&mut session, config(&dir)).unwrap();

        assert!(!recorder.is_started());
        recorder.use_cassette("start", Options::new()).unwrap();
        assert!(recorder.is_started());

        let prefixes: Vec<&str> = recorder.session().mounts().prefixes().collect();
        assert_eq!(prefixes, vec!["http://", "https://"]);
        assert_eq!(recorder.current_cassette(|c| c.name().to_string()).unwrap(), "start");
    }

    #[test]
    fn test_stop_restores_original_mounts() {
        let dir = TempDir::new().unwrap();
        let mut session = session();
        {
            let mut recorder = Recorder::new(&mut session, config(&dir)).unwrap();
            recorder.use_cassette("restore", Options::new()).unwrap();
            recorder.stop().unwrap();
            assert!(!recorder.is_started());
            assert!(recorder.current_cassette(Cassette::len).is_none());
        }
        assert_eq!(session.mounts().prefixes().collect::<Vec<_>>(), vec!["https://"]);
        assert!(matches!(
            session.get("http://a/"),
            Err(TapedeckError::NoTransport(_))
        ));
    }

    #[test]
    fn test_invalid_option_is_discarded() {
        let dir = TempDir::new().unwrap();
        let mut session = session();
        let mut recorder = Recorder::new(&mut session, config(&dir)).unwrap();

        let options = Options::new().with("record", "bogus");
        recorder.use_cassette("bogus", options).unwrap();
        assert_eq!(
            recorder.current_cassette(Cassette::record_mode),
            Some(RecordMode::Once)
        );
    }

    #[test]
    fn test_unregistered_default_matcher_is_config_error() {
        let dir = TempDir::new().unwrap();
        let mut session = session();
        let config = config(&dir).with_default_options(crate::options::CassetteSettings {
            match_requests_on: vec!["digest".to_string()],
            ..Default::default()
        });

        assert!(matches!(
            Recorder::new(&mut session, config),
            Err(TapedeckError::ConfigError(_))
        ));
    }

    #[test]
    fn test_registered_matcher_becomes_valid_option() {
        let dir = TempDir::new().unwrap();
        let mut session = session();
        let mut recorder = Recorder::new(&mut session, config(&dir)).unwrap();
        recorder.register_matcher("always", |_: &Request, _: &Request| true);

        let options = Options::from_value(json!({ "match_requests_on": ["always"] }));
        recorder.use_cassette("custom", options).unwrap();
        assert_eq!(
            recorder.current_cassette(Cassette::match_options),
            Some(vec!["always".to_string()])
        );
    }
}
