//! Conversation handling for one inbound event.
//!
//! Text messages go through, in order:
//! 1. Cart commands (`/cart`, `/checkout`, `/clear_cart` and their Thai forms)
//! 2. Intent resolution, with the fallback greeting short-circuit
//! 3. Greeting and general inquiry texts
//! 4. Product recommendations as an intro text plus a carousel
//! 5. For unresolved messages: exact product titles, keyword suggestions,
//!    then the help text
//!
//! Postbacks open detail cards or add products to the cart.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use perfume_bot_core::{Intent, UserId};

use super::catalog::CatalogService;
use super::replies;
use crate::graph::{CartStore, CartUpdate, GraphError, GraphStore};
use crate::line::{
    InboundEvent, InboundKind, Message, PostbackAction, build_product_carousel,
    build_product_detail, text_with_shortcuts,
};
use crate::nlp::{IntentResolver, Resolution};

/// Errors that abort a turn. The caller answers with a generic apology.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

/// One exchange as stored in chat history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub user_message: String,
    pub bot_message: String,
}

impl Transcript {
    fn new(user_message: impl Into<String>, bot_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            bot_message: bot_message.into(),
        }
    }
}

/// Messages to send back, and the exchange to record if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub messages: Vec<Message>,
    pub transcript: Option<Transcript>,
}

impl Reply {
    /// A single text message recorded verbatim.
    fn text(user_message: &str, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            transcript: Some(Transcript::new(user_message, text.clone())),
            messages: vec![Message::text(text)],
        }
    }

    /// A single text message that is not recorded.
    fn unrecorded(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::text(text)],
            transcript: None,
        }
    }
}

/// Cart commands typed as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ShowCart,
    Checkout,
    ClearCart,
}

impl Command {
    /// Slash forms ignore case; Thai forms must match exactly.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        match (lower.as_str(), text) {
            ("/cart", _) | (_, "ตะกร้า") => Some(Self::ShowCart),
            ("/checkout", _) | (_, "สั่งซื้อ") => Some(Self::Checkout),
            ("/clear_cart", _) | (_, "ล้างตะกร้า") => Some(Self::ClearCart),
            _ => None,
        }
    }
}

/// Turns inbound events into replies.
#[derive(Clone)]
pub struct ConversationService {
    resolver: Arc<IntentResolver>,
    catalog: CatalogService,
    store: Arc<dyn GraphStore>,
}

impl std::fmt::Debug for ConversationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationService")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl ConversationService {
    #[must_use]
    pub fn new(
        resolver: Arc<IntentResolver>,
        catalog: CatalogService,
        store: Arc<dyn GraphStore>,
    ) -> Self {
        Self {
            resolver,
            catalog,
            store,
        }
    }

    /// Produce the reply for one event.
    ///
    /// # Errors
    ///
    /// Returns an error if a cart or product query fails.
    #[instrument(skip(self, event), fields(user_id = %event.user_id))]
    pub async fn handle(&self, event: &InboundEvent) -> Result<Reply, ConversationError> {
        match &event.kind {
            InboundKind::Text(text) => self.handle_text(&event.user_id, text).await,
            InboundKind::Postback(data) => self.handle_postback(&event.user_id, data).await,
        }
    }

    async fn handle_text(&self, user: &UserId, text: &str) -> Result<Reply, ConversationError> {
        if let Some(command) = Command::parse(text) {
            return self.run_command(user, command, text).await;
        }

        let analysis = self.resolver.resolve(text).await;

        let intent = match analysis.resolution {
            Resolution::Greeting { reply } => return Ok(Reply::text(text, reply)),
            Resolution::Unknown => return Ok(self.unresolved(text, &analysis.normalized).await),
            Resolution::Intent { intent, .. } => intent,
        };

        let Some(product_intent) = intent.product() else {
            let reply = replies::intent_reply(intent);
            return Ok(match intent {
                Intent::GeneralInquiry => Reply {
                    messages: vec![text_with_shortcuts(reply)],
                    transcript: Some(Transcript::new(text, reply)),
                },
                _ => Reply::text(text, reply),
            });
        };

        let products = self.catalog.recommend(product_intent).await?;
        if products.is_empty() {
            return Ok(Reply::text(text, replies::no_products_for(text)));
        }

        let intro = replies::intent_reply(intent);
        info!(intent = %intent, count = products.len(), "Sending product carousel");

        Ok(Reply {
            transcript: Some(Transcript::new(
                text,
                replies::carousel_summary(intro, products.len()),
            )),
            messages: vec![Message::text(intro), build_product_carousel(&products)],
        })
    }

    async fn run_command(
        &self,
        user: &UserId,
        command: Command,
        text: &str,
    ) -> Result<Reply, ConversationError> {
        debug!(command = ?command, "Running cart command");

        let (message, summary) = match command {
            Command::ShowCart => {
                let lines = self.store.cart(user).await?;
                (replies::cart_summary(&lines), replies::CART_SHOWN)
            }
            Command::Checkout => {
                let lines = self.store.cart(user).await?;
                (
                    replies::checkout(!lines.is_empty()).to_string(),
                    replies::CHECKOUT_STARTED,
                )
            }
            Command::ClearCart => {
                let removed = self.store.clear_cart(user).await?;
                info!(removed, "Cart cleared");
                (
                    replies::CART_CLEARED.to_string(),
                    replies::CART_CLEARED_SUMMARY,
                )
            }
        };

        Ok(Reply {
            messages: vec![Message::text(message)],
            transcript: Some(Transcript::new(text, summary)),
        })
    }

    /// Reply for a message no intent was resolved for.
    async fn unresolved(&self, text: &str, normalized: &str) -> Reply {
        let is_title = self
            .catalog
            .is_product_title(text)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load product titles");
                false
            });

        if is_title {
            return match self.catalog.find_by_title(text).await {
                Ok(Some(product)) => Reply {
                    messages: vec![build_product_detail(&product)],
                    transcript: Some(Transcript::new(text, replies::detail_summary(text))),
                },
                Ok(None) => Reply::text(text, replies::title_not_found(text)),
                Err(e) => {
                    warn!(error = %e, "Product lookup failed");
                    Reply::text(text, replies::title_lookup_failed(text))
                }
            };
        }

        let matching = self.resolver.keywords().matching_intents(normalized);
        let reply = replies::suggestions(&matching)
            .unwrap_or_else(|| replies::HELP_TEXT.to_string());
        Reply::text(text, reply)
    }

    async fn handle_postback(&self, user: &UserId, data: &str) -> Result<Reply, ConversationError> {
        let action = PostbackAction::parse(data);
        debug!(action = ?action, "Postback received");

        match action {
            PostbackAction::ViewDetail { title } => {
                match self.catalog.find_by_title(&title).await {
                    Ok(Some(product)) => Ok(Reply {
                        messages: vec![build_product_detail(&product)],
                        transcript: Some(Transcript::new(
                            format!("ดูรายละเอียด {title}"),
                            replies::detail_summary(&title),
                        )),
                    }),
                    Ok(None) => Ok(Reply::unrecorded(replies::detail_not_found(&title))),
                    Err(e) => {
                        warn!(error = %e, title = %title, "Product lookup failed");
                        Ok(Reply::unrecorded(replies::detail_not_found(&title)))
                    }
                }
            }
            PostbackAction::AddToCart { title } => {
                match self.store.add_to_cart(user, &title).await? {
                    CartUpdate::Added { quantity } => {
                        info!(title = %title, quantity, "Added to cart");
                        Ok(Reply {
                            messages: vec![Message::text(replies::added_to_cart(&title))],
                            transcript: Some(Transcript::new(
                                format!("เพิ่มในตะกร้า {title}"),
                                replies::added_to_cart_summary(&title),
                            )),
                        })
                    }
                    CartUpdate::ProductMissing => {
                        warn!(title = %title, "Add to cart for unknown product");
                        Ok(Reply::unrecorded(replies::title_not_found(&title)))
                    }
                }
            }
            PostbackAction::Unrecognized { action } => {
                warn!(action = ?action, "Unrecognized postback");
                Ok(Reply::unrecorded(replies::POSTBACK_UNRECOGNIZED))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use perfume_bot_core::{CatalogEntry, ReplyToken};

    use super::*;
    use crate::graph::{CartStore, MemoryGraph};
    use crate::line::{CAROUSEL_ALT_TEXT, Carousel, FlexContainer};
    use crate::nlp::{FallbackIndex, NgramEmbedder, TextNormalizer, default_training_set};

    fn entry(title: &str, status: &str) -> CatalogEntry {
        CatalogEntry {
            title: title.to_string(),
            size: "100 ml".to_string(),
            price: "฿3,200".to_string(),
            image_url: format!("https://cdn.example.com/{}.jpg", title.replace(' ', "-")),
            review: Some("4.8/5".to_string()),
            stock: "In stock".to_string(),
            status: status.to_string(),
            top_note: "Bergamot".to_string(),
            heart_note: "Rose".to_string(),
            base_note: "Musk".to_string(),
        }
    }

    async fn service() -> (Arc<MemoryGraph>, ConversationService) {
        let graph = Arc::new(MemoryGraph::with_catalog(&[
            entry("Rose Noir", "BESTSELLER"),
            entry("Vanilla Dream", "BESTSELLER"),
            entry("Amber Night", "BESTSELLER"),
            entry("Citrus Breeze", "NEW"),
        ]));

        let training = default_training_set(&TextNormalizer::new()).expect("training set");
        let fallback = FallbackIndex::build(Arc::new(NgramEmbedder::default()))
            .await
            .expect("fallback");
        let resolver = Arc::new(IntentResolver::new(&training, fallback).expect("resolver"));
        let catalog = CatalogService::new(graph.clone(), Duration::from_secs(60));

        let service = ConversationService::new(resolver, catalog, graph.clone());
        (graph, service)
    }

    fn text_event(text: &str) -> InboundEvent {
        InboundEvent {
            user_id: UserId::new("U1"),
            reply_token: ReplyToken::new("token"),
            kind: InboundKind::Text(text.to_string()),
        }
    }

    fn postback_event(data: &str) -> InboundEvent {
        InboundEvent {
            user_id: UserId::new("U1"),
            reply_token: ReplyToken::new("token"),
            kind: InboundKind::Postback(data.to_string()),
        }
    }

    fn only_text(reply: &Reply) -> &str {
        assert_eq!(reply.messages.len(), 1, "expected one message");
        reply
            .messages
            .first()
            .and_then(Message::as_text)
            .expect("text message")
    }

    // =========================================================================
    // Commands
    // =========================================================================

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/CART"), Some(Command::ShowCart));
        assert_eq!(Command::parse("ตะกร้า"), Some(Command::ShowCart));
        assert_eq!(Command::parse("/Checkout"), Some(Command::Checkout));
        assert_eq!(Command::parse("ล้างตะกร้า"), Some(Command::ClearCart));
        assert_eq!(Command::parse("ตะกร้า "), None);
        assert_eq!(Command::parse("/cart please"), None);
    }

    #[tokio::test]
    async fn test_empty_cart_command() {
        let (_, service) = service().await;
        let reply = service.handle(&text_event("/cart")).await.expect("reply");
        assert_eq!(only_text(&reply), replies::CART_EMPTY);
        assert_eq!(
            reply.transcript.map(|t| t.bot_message),
            Some(replies::CART_SHOWN.to_string())
        );
    }

    #[tokio::test]
    async fn test_checkout_and_clear() {
        let (graph, service) = service().await;
        service
            .handle(&postback_event("action=add_cart&title=Rose%20Noir"))
            .await
            .expect("add");

        let checkout = service.handle(&text_event("สั่งซื้อ")).await.expect("checkout");
        assert_eq!(only_text(&checkout), replies::CHECKOUT_STEPS);

        let cleared = service.handle(&text_event("/clear_cart")).await.expect("clear");
        assert_eq!(only_text(&cleared), replies::CART_CLEARED);
        assert!(graph.cart(&UserId::new("U1")).await.expect("cart").is_empty());

        let checkout = service.handle(&text_event("/checkout")).await.expect("checkout");
        assert_eq!(only_text(&checkout), replies::CHECKOUT_EMPTY);
    }

    // =========================================================================
    // Intents
    // =========================================================================

    #[tokio::test]
    async fn test_greeting_is_plain_text() {
        let (_, service) = service().await;
        let reply = service.handle(&text_event("สวัสดี")).await.expect("reply");
        assert_eq!(only_text(&reply), replies::intent_reply(Intent::Greeting));
    }

    #[tokio::test]
    async fn test_bestseller_sends_intro_and_carousel() {
        let (_, service) = service().await;
        let reply = service.handle(&text_event("สินค้าขายดี")).await.expect("reply");

        assert_eq!(reply.messages.len(), 2);
        let intro = replies::intent_reply(Intent::ProductBestseller);
        assert_eq!(reply.messages.first().and_then(Message::as_text), Some(intro));

        match reply.messages.get(1) {
            Some(Message::Flex {
                alt_text,
                contents: FlexContainer::Carousel(Carousel { contents }),
            }) => {
                assert_eq!(alt_text, CAROUSEL_ALT_TEXT);
                assert_eq!(contents.len(), 3);
            }
            other => panic!("expected carousel, got {other:?}"),
        }

        assert_eq!(
            reply.transcript.map(|t| t.bot_message),
            Some(replies::carousel_summary(intro, 3))
        );
    }

    #[tokio::test]
    async fn test_unresolved_exact_title_shows_detail() {
        let (_, service) = service().await;
        let reply = service.unresolved("Rose Noir", "rose noir").await;
        assert!(matches!(
            reply.messages.first(),
            Some(Message::Flex { alt_text, .. }) if alt_text == "รายละเอียด Rose Noir"
        ));
    }

    #[tokio::test]
    async fn test_unresolved_suggests_matching_intents() {
        let (_, service) = service().await;
        let normalizer = TextNormalizer::new();

        let text = "อยากได้ แบบ summer";
        let reply = service.unresolved(text, &normalizer.normalize(text)).await;
        assert_eq!(
            only_text(&reply),
            replies::suggestions(&[Intent::SeasonSummer]).expect("suggestion")
        );

        let reply = service.unresolved("qqq", &normalizer.normalize("qqq")).await;
        assert_eq!(only_text(&reply), replies::HELP_TEXT);
    }

    // =========================================================================
    // Postbacks
    // =========================================================================

    #[tokio::test]
    async fn test_add_cart_postback_creates_line() {
        let (graph, service) = service().await;
        let reply = service
            .handle(&postback_event("action=add_cart&product_id=0&title=Rose%20Noir"))
            .await
            .expect("reply");
        assert_eq!(only_text(&reply), replies::added_to_cart("Rose Noir"));

        let cart = graph.cart(&UserId::new("U1")).await.expect("cart");
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.first().map(|l| (l.title.as_str(), l.quantity)), Some(("Rose Noir", 1)));
    }

    #[tokio::test]
    async fn test_add_cart_for_missing_product() {
        let (graph, service) = service().await;
        let reply = service
            .handle(&postback_event("action=add_cart&title=Oud"))
            .await
            .expect("reply");
        assert_eq!(only_text(&reply), replies::title_not_found("Oud"));
        assert!(reply.transcript.is_none());
        assert!(graph.cart(&UserId::new("U1")).await.expect("cart").is_empty());
    }

    #[tokio::test]
    async fn test_view_detail_postback() {
        let (_, service) = service().await;
        let reply = service
            .handle(&postback_event("action=view_detail&product_id=1&title=vanilla%20dream"))
            .await
            .expect("reply");
        assert!(matches!(
            reply.messages.first(),
            Some(Message::Flex { alt_text, .. }) if alt_text == "รายละเอียด Vanilla Dream"
        ));
        assert_eq!(
            reply.transcript,
            Some(Transcript::new(
                "ดูรายละเอียด vanilla dream",
                replies::detail_summary("vanilla dream")
            ))
        );

        let missing = service
            .handle(&postback_event("action=view_detail&title=Oud"))
            .await
            .expect("reply");
        assert_eq!(only_text(&missing), replies::detail_not_found("Oud"));
    }

    #[tokio::test]
    async fn test_unknown_postback() {
        let (_, service) = service().await;
        let reply = service
            .handle(&postback_event("action=share&title=Rose"))
            .await
            .expect("reply");
        assert_eq!(only_text(&reply), replies::POSTBACK_UNRECOGNIZED);
    }
}
