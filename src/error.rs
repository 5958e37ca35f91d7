//! Error types for Tapedeck

use std::io;
use thiserror::Error;

use crate::options::RecordMode;

/// Result type for Tapedeck operations
pub type Result<T> = std::result::Result<T, TapedeckError>;

/// Errors that can occur in Tapedeck
#[derive(Debug, Error)]
pub enum TapedeckError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Cassette file could not be parsed or written by its serializer
    #[error("Invalid cassette format in {path}: {message}")]
    InvalidFormat {
        /// Cassette file involved
        path: String,
        /// Serializer error message
        message: String,
    },

    /// A request was made while no cassette was loaded
    #[error("No cassette was specified or found.")]
    NoCassette,

    /// Invalid cassette name
    #[error("Invalid cassette name: {0}")]
    InvalidCassetteName(String),

    /// No recorded interaction matched and recording is not permitted
    #[error(
        "A request was made that could not be handled.\n\n\
         A request was made to {url} that could not be found in {cassette_path}.\n\n\
         The settings on the cassette are:\n\n    \
         - record_mode: {record_mode}\n    \
         - match_options: {match_options:?}"
    )]
    UnhandledRequest {
        /// URL of the unmatched request
        url: String,
        /// Cassette file that was searched
        cassette_path: String,
        /// Record mode of the cassette
        record_mode: RecordMode,
        /// Matchers active on the cassette
        match_options: Vec<String>,
    },

    /// Attempted to append to a cassette whose mode forbids it
    #[error("Cassette '{cassette}' does not permit recording (record mode: {record_mode})")]
    RecordingNotPermitted {
        /// Cassette name
        cassette: String,
        /// Record mode of the cassette
        record_mode: RecordMode,
    },

    /// Matcher name not present in the registry
    #[error("Unknown request matcher: {0}")]
    UnknownMatcher(String),

    /// Serializer name not present in the registry
    #[error("Unknown serializer: {0}")]
    UnknownSerializer(String),

    /// No original transport is mounted for the URL
    #[error("No transport mounted for {0}")]
    NoTransport(String),

    /// The real transport failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
