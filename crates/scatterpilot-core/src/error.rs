//! Error types for the scatterpilot-core library.
//!
//! Field extraction never fails: unparseable text degrades to a re-prompt or a
//! default inside the dialogue. The errors here cover the request boundary
//! (caller bugs) and configuration/IO only.

use thiserror::Error;

/// Main error type for the scatterpilot library.
#[derive(Error, Debug)]
pub enum ScatterError {
    /// The chat request was rejected before reaching the dialogue engine.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to an incoming chat request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The message is empty or whitespace only.
    #[error("message is required")]
    EmptyMessage,

    /// The message exceeds the configured length limit.
    #[error("message exceeds maximum length of {max} characters (got {actual})")]
    MessageTooLong { max: usize, actual: usize },

    /// The message contains markup or script content that is never accepted.
    #[error("message contains potentially dangerous content")]
    UnsafeContent,

    /// The request body could not be decoded.
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Result type for the scatterpilot library.
pub type Result<T> = std::result::Result<T, ScatterError>;
