//! Error types for the rtdb point store.
//!
//! The store itself is total: reads of missing keys are represented as
//! `Option`/[`FreshRead`](crate::store::FreshRead) results and change
//! decisions always produce a `bool`. Errors only arise at the edges, when
//! timestamps are parsed strictly or when filter configuration is loaded.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for all rtdb operations.
#[derive(Error, Debug)]
pub enum RtdbError {
    /// Error parsing a wire timestamp.
    #[error("timestamp error: {0}")]
    Timestamp(#[from] TimestampError),

    /// Error loading or validating configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur when parsing timestamps strictly.
///
/// The lenient path ([`IsoTimestamp::parse_or_now`](crate::IsoTimestamp::parse_or_now))
/// never returns this; it substitutes the current time instead.
#[derive(Error, Debug)]
pub enum TimestampError {
    /// The input is not laid out as `YYYY-MM-DDTHH:MM:SS[.fff]±HHMM`.
    #[error("timestamp '{input}' does not match YYYY-MM-DDTHH:MM:SS[.fff]±HHMM")]
    Layout {
        /// The rejected input text.
        input: String,
    },

    /// The input has the right layout but names an invalid date or time.
    #[error("malformed timestamp '{input}': {source}")]
    Malformed {
        /// The rejected input text.
        input: String,
        /// The underlying chrono parse error.
        #[source]
        source: chrono::ParseError,
    },
}

/// Errors that can occur when building or loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The deadband aperture is negative, NaN or infinite.
    #[error("invalid aperture {aperture}: must be finite and >= 0")]
    InvalidAperture {
        /// The rejected aperture.
        aperture: f64,
    },

    /// A priority name was not recognised.
    #[error("unknown priority '{value}' (expected a number, value-quality, value-quality-timestamp or deadband)")]
    UnknownPriority {
        /// The rejected priority text.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected shape.
    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for `Result<T, RtdbError>`.
pub type Result<T> = std::result::Result<T, RtdbError>;
