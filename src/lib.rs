//! Tapedeck - Record and replay HTTP interactions from cassettes
//!
//! Tests route outbound requests through a [`Session`]. A [`Recorder`] swaps
//! the session's transports for an interception adapter that replays
//! recorded interactions from a cassette file, records new ones through the
//! real transport when the record mode allows it, and fails otherwise.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::field_reassign_with_default,
    clippy::multiple_crate_versions
)]

pub mod adapter;
pub mod cassette;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod interaction;
pub mod matchers;
pub mod options;
pub mod placeholder;
pub mod recorder;
pub mod serializers;
pub mod session;
pub mod transport;

pub use adapter::InterceptionAdapter;
pub use cassette::Cassette;
pub use config::Config;
pub use error::{Result, TapedeckError};
pub use interaction::{Body, Headers, Interaction, Request, Response, Status};
pub use matchers::{Matcher, MatcherRegistry};
pub use options::{CassetteSettings, Options, RecordMode};
pub use placeholder::Placeholder;
pub use recorder::Recorder;
pub use serializers::{Serializer, SerializerRegistry};
pub use session::Session;
pub use transport::{HttpTransport, Mounts, Transport};
