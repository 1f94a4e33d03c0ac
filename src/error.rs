//! Error type for the dictionary parser and its collaborators.
//!
//! Malformed dictionary text is never an error: the parser degrades to
//! fewer populated fields instead. Only the conditions below are reported.

use thiserror::Error;

/// The error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum DictError {
    /// Reading the source text or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A vocabulary schema file could not be parsed.
    #[error("Failed to parse schema YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A dictionary document or index could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A vocabulary token produced an invalid pattern.
    #[error("Invalid vocabulary pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The schema parsed but is unusable.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

pub type Result<T> = std::result::Result<T, DictError>;
