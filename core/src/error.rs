//! Error types for the catalog client.
//!
//! # Design
//! Errors fall into two classes that callers need to tell apart: transport
//! failures (the host could not reach the catalog, or the catalog answered
//! with a non-2xx status) and parse failures (the catalog answered, but the
//! body is unusable). Both end the current phase. `AlreadyStarted` reports
//! protocol misuse and never ends a phase.

use thiserror::Error;

/// Errors produced by `CatalogClient`, `CatalogSession` and `Settings`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The catalog answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The host could not complete the HTTP round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The configuration response lacks the image base URL or poster sizes,
    /// or is not valid JSON.
    #[error("configuration parse failed: {0}")]
    ConfigParse(String),

    /// The listing response, or one of its records, could not be parsed.
    #[error("listing parse failed: {0}")]
    Parse(String),

    /// `start` was called on a session that already left `Idle`.
    #[error("session already started")]
    AlreadyStarted,

    /// Settings could not be loaded or are incomplete.
    #[error("invalid settings: {0}")]
    Settings(String),
}

impl CatalogError {
    /// True for network failures and non-2xx responses.
    pub fn is_transport(&self) -> bool {
        matches!(self, CatalogError::Http { .. } | CatalogError::Transport(_))
    }

    /// True for malformed or incomplete response bodies.
    pub fn is_parse(&self) -> bool {
        matches!(self, CatalogError::ConfigParse(_) | CatalogError::Parse(_))
    }
}

impl From<config::ConfigError> for CatalogError {
    fn from(e: config::ConfigError) -> Self {
        CatalogError::Settings(e.to_string())
    }
}
