//! LINE Messaging API integration.
//!
//! Inbound webhook parsing and signature verification, outbound replies and
//! the Flex message builders for product cards.

mod client;
mod error;
mod messages;
mod postback;
mod types;

pub use client::{
    LINE_API_BASE, LineClient, ReplySender, SIGNATURE_HEADER, sign, verify_signature,
};
pub use error::LineError;
pub use messages::{
    BROWSE_MORE_TEXT, CAROUSEL_ALT_TEXT, build_product_carousel, build_product_detail,
    general_inquiry_quick_replies, text_with_shortcuts,
};
pub use postback::{PostbackAction, add_cart_data, view_detail_data};
pub use types::{
    Action, Bubble, ButtonStyle, Carousel, Component, EventMessage, EventSource, FlexBox,
    FlexButton, FlexContainer, FlexImage, FlexText, InboundEvent, InboundKind, Layout, Message,
    PostbackContent, QuickReply, QuickReplyItem, ReplyRequest, WebhookEvent, WebhookPayload,
};
