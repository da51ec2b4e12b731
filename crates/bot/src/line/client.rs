//! LINE Messaging API client.
//!
//! Provides reply delivery and webhook signature verification.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, error, instrument};

use perfume_bot_core::ReplyToken;

use super::error::LineError;
use super::types::{Message, ReplyRequest};

/// Default Messaging API base URL.
pub const LINE_API_BASE: &str = "https://api.line.me";

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Delivers reply messages for a reply token.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Send up to five messages in reply to one event.
    async fn reply(&self, token: &ReplyToken, messages: &[Message]) -> Result<(), LineError>;
}

/// LINE API client.
#[derive(Clone)]
pub struct LineClient {
    client: Client,
    access_token: SecretString,
    api_base: String,
}

impl std::fmt::Debug for LineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineClient")
            .field("access_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl LineClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `LineError::Config` if the HTTP client cannot be built.
    pub fn new(
        access_token: SecretString,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LineError::Config(e.to_string()))?;

        Ok(Self {
            client,
            access_token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReplySender for LineClient {
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    async fn reply(&self, token: &ReplyToken, messages: &[Message]) -> Result<(), LineError> {
        let body = ReplyRequest {
            reply_token: token.as_str(),
            messages,
        };

        let response = self
            .client
            .post(format!("{}/v2/bot/message/reply", self.api_base))
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LineError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "LINE API rejected reply");
            return Err(LineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Reply delivered to LINE");

        Ok(())
    }
}

/// Verify a LINE webhook signature.
///
/// The signature is the base64-encoded HMAC-SHA256 of the raw request body,
/// keyed with the channel secret:
/// <https://developers.line.biz/en/docs/messaging-api/receiving-messages/#verify-signature>
///
/// # Errors
///
/// Returns `LineError::InvalidSignature` if the signature does not match.
pub fn verify_signature(
    channel_secret: &SecretString,
    body: &str,
    signature: &str,
) -> Result<(), LineError> {
    let expected = sign(channel_secret, body)?;

    if !constant_time_compare(&expected, signature.trim()) {
        return Err(LineError::InvalidSignature(
            "Signature mismatch".to_string(),
        ));
    }

    debug!("LINE signature verified");

    Ok(())
}

/// Compute the signature LINE sends for `body`.
///
/// # Errors
///
/// Returns `LineError::InvalidSignature` if the secret is unusable as a key.
pub fn sign(channel_secret: &SecretString, body: &str) -> Result<String, LineError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.expose_secret().as_bytes())
        .map_err(|e| LineError::InvalidSignature(e.to_string()))?;
    mac.update(body.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
