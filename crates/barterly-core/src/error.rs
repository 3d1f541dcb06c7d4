//! Error types for the Barterly matching engine.

use thiserror::Error;

/// Result type alias using Barterly's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Barterly operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(uuid::Uuid),

    /// Match not found
    #[error("Match not found: {0}")]
    MatchNotFound(uuid::Uuid),

    /// Vector dimensions disagree where they must match
    #[error("Vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A vector operand was empty
    #[error("Vectors cannot be empty")]
    EmptyVector,

    /// Weighted combination received weights that cannot be normalized
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// Parallel collections have different lengths
    #[error("Length mismatch: {vectors} vectors vs {weights} weights")]
    LengthMismatch { vectors: usize, weights: usize },

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
