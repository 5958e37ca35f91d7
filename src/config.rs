//! Configuration types for Tapedeck

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::options::CassetteSettings;
use crate::placeholder::Placeholder;
use crate::{Result, TapedeckError};

/// Library directory used when none is configured
pub const DEFAULT_LIBRARY_DIR: &str = "vcr/cassettes";

/// Main configuration
///
/// Built once and handed to a [`Recorder`](crate::recorder::Recorder); it is
/// never mutated while cassettes are in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding cassette files
    pub cassette_library_dir: PathBuf,
    /// Settings used for every option not given to `use_cassette`
    pub default_cassette_options: CassetteSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cassette_library_dir: PathBuf::from(DEFAULT_LIBRARY_DIR),
            default_cassette_options: CassetteSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TapedeckError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| TapedeckError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Set the cassette library directory
    #[must_use]
    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cassette_library_dir = dir.into();
        self
    }

    /// Replace the default cassette settings
    #[must_use]
    pub fn with_default_options(mut self, settings: CassetteSettings) -> Self {
        self.default_cassette_options = settings;
        self
    }

    /// Add a placeholder applied to every cassette
    #[must_use]
    pub fn define_cassette_placeholder(
        mut self,
        placeholder: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        self.default_cassette_options
            .placeholders
            .push(Placeholder::new(placeholder, replace));
        self
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.cassette_library_dir.as_os_str().is_empty() {
            return Err(TapedeckError::ConfigError(
                "cassette_library_dir cannot be empty".to_string(),
            ));
        }

        let defaults = &self.default_cassette_options;

        if let Some(days) = defaults.re_record_interval {
            if !days.is_finite() || days <= 0.0 {
                return Err(TapedeckError::ConfigError(format!(
                    "re_record_interval must be a positive number of days, got {days}"
                )));
            }
        }

        for (i, placeholder) in defaults.placeholders.iter().enumerate() {
            if placeholder.placeholder.is_empty() {
                return Err(TapedeckError::ConfigError(format!(
                    "Placeholder {i}: placeholder token cannot be empty"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RecordMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.cassette_library_dir, PathBuf::from("vcr/cassettes"));

        let defaults = &config.default_cassette_options;
        assert_eq!(defaults.match_requests_on, vec!["method", "uri"]);
        assert_eq!(defaults.record, RecordMode::Once);
        assert_eq!(defaults.serialize_with, "json");
        assert_eq!(defaults.re_record_interval, None);
        assert!(!defaults.preserve_exact_body_bytes);
        assert!(defaults.placeholders.is_empty());
    }

    #[test]
    fn test_config_parse() {
        let config_toml = r#"
            cassette_library_dir = "tests/cassettes"

            [default_cassette_options]
            record = "new_episodes"
            match_requests_on = ["method", "uri", "body"]
            re_record_interval = 7

            [[default_cassette_options.placeholders]]
            placeholder = "<API_KEY>"
            replace = "secret123"
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.cassette_library_dir, PathBuf::from("tests/cassettes"));

        let defaults = &config.default_cassette_options;
        assert_eq!(defaults.record, RecordMode::NewEpisodes);
        assert_eq!(defaults.match_requests_on, vec!["method", "uri", "body"]);
        assert_eq!(defaults.re_record_interval, Some(7.0));
        assert_eq!(defaults.serialize_with, "json");
        assert_eq!(
            defaults.placeholders,
            vec![Placeholder::new("<API_KEY>", "secret123")]
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        let config_toml = r#"
            cassette_library_dir = "fixtures"

            [default_cassette_options]
            serialize_with = "yaml"
        "#;
        file.write_all(config_toml.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.default_cassette_options.serialize_with, "yaml");
        assert_eq!(config.default_cassette_options.record, RecordMode::Once);
    }

    #[test]
    fn test_config_from_file_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"recording_dir = \"/tmp\"\n").unwrap();

        assert!(matches!(
            Config::from_file(file.path()),
            Err(TapedeckError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = Config::from_file(Path::new("/nonexistent/tapedeck.toml"));
        assert!(matches!(result, Err(TapedeckError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_config_empty_library_dir() {
        let config = Config::default().with_library_dir("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_config_empty_placeholder_token() {
        let config = Config::default().define_cassette_placeholder("", "secret");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_config_negative_interval() {
        let config = Config::default().with_default_options(CassetteSettings {
            re_record_interval: Some(-1.0),
            ..CassetteSettings::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_define_cassette_placeholder_appends_in_order() {
        let config = Config::default()
            .define_cassette_placeholder("<A>", "a")
            .define_cassette_placeholder("<B>", "b");

        let tokens: Vec<&str> = config
            .default_cassette_options
            .placeholders
            .iter()
            .map(|p| p.placeholder.as_str())
            .collect();
        assert_eq!(tokens, vec!["<A>", "<B>"]);
        assert!(config.validate().is_ok());
    }
}
