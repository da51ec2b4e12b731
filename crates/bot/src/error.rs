//! Unified error handling for the bot.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::graph::GraphError;
use crate::line::LineError;
use crate::nlp::NlpError;
use crate::services::ConversationError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Graph operation failed.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// LINE API operation failed.
    #[error("LINE error: {0}")]
    Line(#[from] LineError),

    /// Intent resolution setup failed.
    #[error("NLP error: {0}")]
    Nlp(#[from] NlpError),

    /// A conversation turn failed.
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Log the error and send it to Sentry.
    pub fn report(&self) {
        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Bot error"
        );
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Graph(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Line(_) => StatusCode::BAD_GATEWAY,
            Self::Nlp(_) | Self::Conversation(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Graph(_) => "Service unavailable",
            Self::Line(_) => "External service error",
            Self::Nlp(_) | Self::Conversation(_) | Self::Internal(_) => "Internal server error",
        };

        (self.status(), message).into_response()
    }
}

/// Set the Sentry user context from a LINE user ID.
pub fn set_sentry_user(user_id: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
