//! Error types for the story-sync library.
//!
//! All fallible operations in the crate return [`Result`], with one error
//! kind per failure class the pipeline can report.

use thiserror::Error;

/// Errors reported by the story-sync pipeline.
#[derive(Debug, Error)]
pub enum StorySyncError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An input media handle could not be opened
    #[error("Missing track: {0}")]
    MissingTrack(String),

    /// An input track has a degenerate (zero or negative) duration
    #[error("Track too short: {0}")]
    TrackTooShort(String),

    /// The caller required caption chunks and none were produced
    #[error("Empty transcript: {0}")]
    EmptyTranscript(String),

    /// The word-timing list violates its ordering/overlap contract
    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),

    /// A caption style resource could not be resolved
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// The external encode/mux collaborator failed
    #[error("Encode failed: {0}")]
    EncodeFailed(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for the story-sync library.
pub type Result<T> = std::result::Result<T, StorySyncError>;
