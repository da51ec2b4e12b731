//! LINE-related errors.

use thiserror::Error;

/// Errors that can occur when interacting with the LINE Messaging API.
#[derive(Debug, Error)]
pub enum LineError {
    /// HTTP request failed or timed out.
    #[error("LINE request failed: {0}")]
    Request(String),

    /// LINE answered with a non-success status.
    #[error("LINE API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Webhook signature missing or wrong.
    #[error("Invalid LINE signature: {0}")]
    InvalidSignature(String),

    /// Webhook body is not a LINE event envelope.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Client could not be constructed.
    #[error("LINE configuration error: {0}")]
    Config(String),
}
