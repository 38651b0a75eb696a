//! Error types for Autoconform.

use thiserror::Error;

/// Main error type for Autoconform operations.
#[derive(Error, Debug)]
pub enum ConformError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid timecode: {0}")]
    InvalidTimecode(String),

    #[error("EDL read error: {0}")]
    EdlRead(String),

    #[error("Shot not found: {0}")]
    ShotNotFound(String),

    #[error("Shot invalid: {0}")]
    ShotInvalid(String),

    #[error("Probe failure: {0}")]
    Probe(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Job cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Autoconform operations.
pub type Result<T> = std::result::Result<T, ConformError>;
