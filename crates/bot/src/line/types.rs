//! LINE Messaging API types.
//!
//! Outbound: text messages with optional quick replies, and Flex messages
//! built from bubbles. Only the Flex components the bot renders are
//! modelled.
//!
//! Inbound: the webhook envelope and the message and postback events the bot
//! answers; every other event type deserializes to
//! [`WebhookEvent::Unsupported`].
//!
//! See: <https://developers.line.biz/en/reference/messaging-api/>

use perfume_bot_core::{ReplyToken, UserId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Outbound Messages
// =============================================================================

/// A message sent in a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Plain text, optionally with quick-reply buttons.
    Text {
        text: String,
        #[serde(rename = "quickReply", skip_serializing_if = "Option::is_none", default)]
        quick_reply: Option<QuickReply>,
    },
    /// Rich layout.
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: FlexContainer,
    },
}

impl Message {
    /// Create a plain text message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            quick_reply: None,
        }
    }

    /// The text of a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Flex { .. } => None,
        }
    }
}

/// Quick-reply buttons shown above the keyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

/// One quick-reply button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuickReplyItem {
    Action { action: Action },
}

/// What happens when a button or image is tapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Send `data` back to the webhook as a postback event.
    Postback {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        label: Option<String>,
        data: String,
    },
    /// Send `text` as if the user typed it.
    Message { label: String, text: String },
}

impl Action {
    #[must_use]
    pub fn postback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Postback {
            label: Some(label.into()),
            data: data.into(),
        }
    }

    #[must_use]
    pub fn message(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Message {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Top-level Flex container.
///
/// Each container writes its own `type`, so a bubble is tagged the same
/// whether it stands alone or sits inside a carousel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexContainer {
    Bubble(Bubble),
    Carousel(Carousel),
}

/// Horizontally scrolling bubbles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "carousel")]
pub struct Carousel {
    pub contents: Vec<Bubble>,
}

/// A single card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "bubble")]
pub struct Bubble {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hero: Option<Component>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body: Option<Component>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub footer: Option<Component>,
}

/// Flex layout components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Box(FlexBox),
    Text(FlexText),
    Image(FlexImage),
    Button(FlexButton),
    Separator {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        margin: Option<String>,
    },
}

/// Box layout direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Vertical,
    Horizontal,
    Baseline,
}

/// Container for other components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexBox {
    pub layout: Layout,
    pub contents: Vec<Component>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub spacing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub margin: Option<String>,
}

impl FlexBox {
    #[must_use]
    pub const fn new(layout: Layout, contents: Vec<Component>) -> Self {
        Self {
            layout,
            contents,
            spacing: None,
            margin: None,
        }
    }

    #[must_use]
    pub fn spacing(mut self, spacing: &str) -> Self {
        self.spacing = Some(spacing.to_string());
        self
    }

    #[must_use]
    pub fn margin(mut self, margin: &str) -> Self {
        self.margin = Some(margin.to_string());
        self
    }
}

/// Text component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlexText {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub wrap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub flex: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub margin: Option<String>,
}

impl FlexText {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn wrap(mut self) -> Self {
        self.wrap = Some(true);
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.weight = Some("bold".to_string());
        self
    }

    #[must_use]
    pub fn size(mut self, size: &str) -> Self {
        self.size = Some(size.to_string());
        self
    }

    #[must_use]
    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    #[must_use]
    pub const fn flex(mut self, flex: u32) -> Self {
        self.flex = Some(flex);
        self
    }

    #[must_use]
    pub fn margin(mut self, margin: &str) -> Self {
        self.margin = Some(margin.to_string());
        self
    }
}

/// Image component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexImage {
    pub url: String,
    pub size: String,
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String,
    #[serde(rename = "aspectMode")]
    pub aspect_mode: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub action: Option<Action>,
}

/// Button component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexButton {
    pub style: ButtonStyle,
    pub action: Action,
}

/// Button style (affects color).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Link,
}

/// Request body for the reply endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyRequest<'a> {
    #[serde(rename = "replyToken")]
    pub reply_token: &'a str,
    pub messages: &'a [Message],
}

// =============================================================================
// Inbound Webhook
// =============================================================================

/// Webhook delivery envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// Bot user ID the events are for.
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// A webhook event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookEvent {
    /// The user sent a message.
    Message {
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        source: EventSource,
        message: EventMessage,
    },
    /// The user tapped a postback action.
    Postback {
        #[serde(rename = "replyToken", default)]
        reply_token: Option<String>,
        source: EventSource,
        postback: PostbackContent,
    },
    /// Follow, unfollow, join and the other event types.
    #[serde(other)]
    Unsupported,
}

/// Who sent the event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

/// Message content of a message event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventMessage {
    Text { text: String },
    /// Stickers, images, locations and other non-text content.
    #[serde(other)]
    Other,
}

/// Postback payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PostbackContent {
    pub data: String,
}

/// An event the bot answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub reply_token: ReplyToken,
    pub kind: InboundKind,
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// Typed text.
    Text(String),
    /// Raw postback data.
    Postback(String),
}

impl WebhookEvent {
    /// Convert to an answerable event.
    ///
    /// Returns `None` for unsupported events, non-text messages, and events
    /// without a user or reply token.
    #[must_use]
    pub fn into_inbound(self) -> Option<InboundEvent> {
        let (reply_token, source, kind) = match self {
            Self::Message {
                reply_token,
                source,
                message: EventMessage::Text { text },
            } => (reply_token, source, InboundKind::Text(text)),
            Self::Postback {
                reply_token,
                source,
                postback,
            } => (reply_token, source, InboundKind::Postback(postback.data)),
            Self::Message { .. } | Self::Unsupported => return None,
        };

        Some(InboundEvent {
            user_id: UserId::new(source.user_id?),
            reply_token: ReplyToken::new(reply_token?),
            kind,
        })
    }
}
