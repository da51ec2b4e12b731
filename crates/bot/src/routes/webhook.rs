//! LINE webhook handler.
//!
//! Every delivery is answered with `200 OK`, whatever happens inside, so LINE
//! never retries a delivery we have already acted on.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{AppError, set_sentry_user};
use crate::graph::HistoryStore;
use crate::line::{
    InboundEvent, Message, ReplySender, SIGNATURE_HEADER, WebhookPayload, verify_signature,
};
use crate::services::replies::PROCESSING_FAILED;
use crate::services::{Reply, Transcript};
use crate::state::AppState;

/// Create webhook routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handle_webhook))
        .route("/webhook", post(handle_webhook))
}

/// Handle a webhook delivery.
///
/// Events are processed one after another in delivery order.
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Err(e) = verify_signature(state.channel_secret(), &body, signature) {
        warn!(error = %e, "Rejected webhook delivery");
        return (StatusCode::OK, "OK");
    }

    let payload: WebhookPayload = match serde_json::from_str(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Failed to parse webhook payload");
            return (StatusCode::OK, "OK");
        }
    };

    debug!(events = payload.events.len(), "Webhook received");

    for event in payload.events {
        match event.into_inbound() {
            Some(inbound) => process_event(&state, &inbound).await,
            None => debug!("Skipping unsupported event"),
        }
    }

    (StatusCode::OK, "OK")
}

/// Reply to one event and record the exchange.
#[instrument(skip(state, event), fields(user_id = %event.user_id))]
async fn process_event(state: &AppState, event: &InboundEvent) {
    set_sentry_user(event.user_id.as_str());

    let reply = match state.conversation().handle(event).await {
        Ok(reply) => reply,
        Err(e) => {
            AppError::from(e).report();
            Reply {
                messages: vec![Message::text(PROCESSING_FAILED)],
                transcript: None,
            }
        }
    };

    if let Err(e) = state
        .messenger()
        .reply(&event.reply_token, &reply.messages)
        .await
    {
        AppError::from(e).report();
    }

    if let Some(Transcript {
        user_message,
        bot_message,
    }) = &reply.transcript
    {
        match state
            .graph()
            .record_turn(&event.user_id, user_message, bot_message)
            .await
        {
            Ok(()) => info!("Turn recorded"),
            Err(e) => warn!(error = %e, "Failed to record chat history"),
        }
    }
}
