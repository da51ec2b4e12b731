//! Error types for intent resolution.

use thiserror::Error;

/// Errors that can occur while preparing or running intent resolution.
#[derive(Debug, Error)]
pub enum NlpError {
    /// Failed to generate embeddings.
    #[error("embedding generation failed: {0}")]
    Embedding(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response from the embedding API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// The classifier was given nothing to learn from.
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// IO error (file read).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error (YAML parsing, validation).
    #[error("configuration error: {0}")]
    Config(String),
}
