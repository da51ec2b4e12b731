//! Integration tests for the perfume bot.
//!
//! Drives the full router (signature check, webhook parsing, conversation,
//! reply, history) in-process against the in-memory graph, the local n-gram
//! embedder and a reply sender that records instead of calling LINE.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p perfume-bot-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt;

use perfume_bot::config::BotConfig;
use perfume_bot::graph::MemoryGraph;
use perfume_bot::line::{LineError, Message, ReplySender, SIGNATURE_HEADER, sign};
use perfume_bot::nlp::{IntentResolver, NgramEmbedder};
use perfume_bot::state::AppState;
use perfume_bot_core::{CatalogEntry, ReplyToken};

pub const CHANNEL_SECRET: &str = "e4a9c0c53b05d472f93d01e2a0b52c6f";
const ACCESS_TOKEN: &str = "kQ8vZ2mN4pR7tW1yB5dF9hJ3lX6cV0sA";

/// A reply the bot tried to send.
#[derive(Debug, Clone)]
pub struct SentReply {
    pub token: ReplyToken,
    pub messages: Vec<Message>,
}

/// Reply sender that keeps every reply in memory.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentReply>>,
    fail: AtomicBool,
}

impl RecordingSender {
    /// Make every following reply fail with an API error.
    pub fn fail_replies(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentReply> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ReplySender for RecordingSender {
    async fn reply(&self, token: &ReplyToken, messages: &[Message]) -> Result<(), LineError> {
        self.sent.lock().await.push(SentReply {
            token: token.clone(),
            messages: messages.to_vec(),
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(LineError::Api {
                status: 400,
                body: "Invalid reply token".to_string(),
            });
        }
        Ok(())
    }
}

/// The bot router wired to in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub graph: Arc<MemoryGraph>,
    pub sender: Arc<RecordingSender>,
    secret: SecretString,
}

impl TestApp {
    /// An app over [`default_catalog`].
    pub async fn new() -> Self {
        Self::with_catalog(&default_catalog()).await
    }

    pub async fn with_catalog(entries: &[CatalogEntry]) -> Self {
        let config = BotConfig::from_vars(|key| match key {
            "LINE_CHANNEL_ACCESS_TOKEN" => Some(ACCESS_TOKEN.to_string()),
            "LINE_CHANNEL_SECRET" => Some(CHANNEL_SECRET.to_string()),
            "CATALOG_PATH" => Some("unused.json".to_string()),
            _ => None,
        })
        .expect("test config");

        let graph = Arc::new(MemoryGraph::with_catalog(entries));
        let sender = Arc::new(RecordingSender::default());
        let resolver = IntentResolver::load(None, Arc::new(NgramEmbedder::default()))
            .await
            .expect("resolver");

        let state = AppState::new(config, graph.clone(), resolver, sender.clone());

        Self {
            router: perfume_bot::app(state),
            graph,
            sender,
            secret: SecretString::from(CHANNEL_SECRET),
        }
    }

    /// POST a correctly signed delivery to `/`.
    pub async fn deliver(&self, body: &str) -> (StatusCode, String) {
        let signature = sign(&self.secret, body).expect("sign");
        self.post("/", body, Some(&signature)).await
    }

    pub async fn post(
        &self,
        uri: &str,
        body: &str,
        signature: Option<&str>,
    ) -> (StatusCode, String) {
        let mut request = Request::post(uri).header("content-type", "application/json");
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        let request = request.body(Body::from(body.to_string())).expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::get(uri).body(Body::empty()).expect("request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn entry(title: &str, status: &str, review: Option<&str>) -> CatalogEntry {
    CatalogEntry {
        title: title.to_string(),
        size: "100 ml".to_string(),
        price: "฿3,200".to_string(),
        image_url: format!("https://cdn.example.com/{}.jpg", title.replace(' ', "-")),
        review: review.map(String::from),
        stock: "In stock".to_string(),
        status: status.to_string(),
        top_note: "Bergamot".to_string(),
        heart_note: "Rose".to_string(),
        base_note: "Musk".to_string(),
    }
}

/// Three bestsellers and one new arrival.
pub fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        entry("Rose Noir", "BESTSELLER", Some("4.8/5")),
        entry("Vanilla Dream", "BESTSELLER", Some("4.5/5")),
        entry("Amber Night", "BESTSELLER", None),
        entry("Citrus Breeze", "NEW", Some("3.9/5")),
    ]
}

pub fn text_event(user_id: &str, reply_token: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": reply_token,
        "source": { "type": "user", "userId": user_id },
        "timestamp": 1_700_000_000_000_u64,
        "message": { "id": "1", "type": "text", "text": text }
    })
}

pub fn postback_event(user_id: &str, reply_token: &str, data: &str) -> Value {
    json!({
        "type": "postback",
        "replyToken": reply_token,
        "source": { "type": "user", "userId": user_id },
        "timestamp": 1_700_000_000_000_u64,
        "postback": { "data": data }
    })
}

/// Webhook envelope around `events`.
pub fn delivery(events: Vec<Value>) -> String {
    json!({ "destination": "Ubot", "events": events }).to_string()
}
