//! Webhook deliveries end to end: signature, reply and recorded history.

use axum::http::StatusCode;
use perfume_bot::line::{Carousel, FlexContainer, Message};
use perfume_bot::services::replies;
use perfume_bot_core::Intent;
use perfume_bot_integration_tests::{
    TestApp, default_catalog, delivery, postback_event, text_event,
};

fn texts(messages: &[Message]) -> Vec<&str> {
    messages.iter().filter_map(Message::as_text).collect()
}

// =============================================================================
// Signature
// =============================================================================

#[tokio::test]
async fn test_unsigned_delivery_is_dropped() {
    let app = TestApp::new().await;
    let body = delivery(vec![text_event("U1", "r-1", "สวัสดี")]);

    let (status, text) = app.post("/", &body, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");
    assert!(app.sender.sent().await.is_empty());
    assert!(app.graph.turns().await.is_empty());
}

#[tokio::test]
async fn test_wrong_signature_is_dropped() {
    let app = TestApp::new().await;
    let body = delivery(vec![text_event("U1", "r-1", "สวัสดี")]);

    let (status, _) = app
        .post("/", &body, Some("c2lnbmVkIGJ5IHNvbWVvbmUgZWxzZQ=="))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.sender.sent().await.is_empty());
}

#[tokio::test]
async fn test_malformed_body_still_returns_ok() {
    let app = TestApp::new().await;
    let (status, text) = app.deliver("{not json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");
    assert!(app.sender.sent().await.is_empty());
}

// =============================================================================
// Messages
// =============================================================================

#[tokio::test]
async fn test_greeting_reply_has_no_cards() {
    let app = TestApp::new().await;
    let (status, _) = app
        .deliver(&delivery(vec![text_event("U1", "r-1", "สวัสดี")]))
        .await;
    assert_eq!(status, StatusCode::OK);

    let sent = app.sender.sent().await;
    assert_eq!(sent.len(), 1);
    let reply = sent.first().expect("reply");
    assert_eq!(reply.token.as_str(), "r-1");
    let greeting = replies::intent_reply(Intent::Greeting);
    assert_eq!(texts(&reply.messages), vec![greeting]);
    assert!(
        !reply
            .messages
            .iter()
            .any(|m| matches!(m, Message::Flex { .. }))
    );

    let turns = app.graph.turns().await;
    assert_eq!(turns.len(), 1);
    let turn = turns.first().expect("turn");
    assert_eq!(turn.user_id.as_str(), "U1");
    assert_eq!(turn.user_message, "สวัสดี");
    assert_eq!(turn.bot_message, greeting);
}

#[tokio::test]
async fn test_bestsellers_reply_with_carousel() {
    let app = TestApp::new().await;
    app.deliver(&delivery(vec![text_event("U1", "r-1", "สินค้าขายดี")]))
        .await;

    let sent = app.sender.sent().await;
    let reply = sent.first().expect("reply");
    assert_eq!(reply.messages.len(), 2);

    let intro = replies::intent_reply(Intent::ProductBestseller);
    assert_eq!(reply.messages.first().and_then(Message::as_text), Some(intro));

    let carousel = reply.messages.get(1).expect("carousel");
    let Message::Flex {
        contents: FlexContainer::Carousel(Carousel { contents }),
        ..
    } = carousel
    else {
        panic!("expected a carousel, got {carousel:?}");
    };
    assert_eq!(contents.len(), 3);

    let wire = serde_json::to_value(carousel).expect("serialize");
    assert_eq!(wire["contents"]["type"], "carousel");
    for item in wire["contents"]["contents"].as_array().expect("bubbles") {
        assert_eq!(item["type"], "bubble", "{item}");
    }

    for bubble in contents {
        let json = serde_json::to_string(bubble).expect("serialize");
        assert!(json.contains("action=view_detail"), "{json}");
        assert_eq!(json.matches("action=add_cart").count(), 1, "{json}");
    }

    let turns = app.graph.turns().await;
    assert_eq!(
        turns.first().map(|t| t.bot_message.clone()),
        Some(replies::carousel_summary(intro, 3))
    );
}

#[tokio::test]
async fn test_intent_without_matches_shows_most_reviewed() {
    let app = TestApp::new().await;
    app.deliver(&delivery(vec![text_event("U1", "r-1", "limited edition")]))
        .await;

    let sent = app.sender.sent().await;
    let reply = sent.first().expect("reply");
    assert_eq!(
        reply.messages.first().and_then(Message::as_text),
        Some(replies::intent_reply(Intent::ProductLimited))
    );

    let json = serde_json::to_string(&reply.messages).expect("serialize");
    for entry in default_catalog() {
        assert!(json.contains(&entry.title), "missing {}", entry.title);
    }
}

#[tokio::test]
async fn test_webhook_alias_route() {
    let app = TestApp::new().await;
    let body = delivery(vec![text_event("U1", "r-1", "/cart")]);
    let signature = perfume_bot::line::sign(
        &secrecy::SecretString::from(perfume_bot_integration_tests::CHANNEL_SECRET),
        &body,
    )
    .expect("sign");

    let (status, _) = app.post("/webhook", &body, Some(&signature)).await;
    assert_eq!(status, StatusCode::OK);

    let sent = app.sender.sent().await;
    assert_eq!(
        sent.first().map(|r| texts(&r.messages)),
        Some(vec![replies::CART_EMPTY])
    );
}

// =============================================================================
// Deliveries
// =============================================================================

#[tokio::test]
async fn test_events_processed_in_order() {
    let app = TestApp::new().await;
    app.deliver(&delivery(vec![
        postback_event("U1", "r-1", "action=add_cart&product_id=0&title=Rose%20Noir"),
        text_event("U1", "r-2", "/cart"),
        text_event("U2", "r-3", "/cart"),
    ]))
    .await;

    let sent = app.sender.sent().await;
    let tokens: Vec<&str> = sent.iter().map(|r| r.token.as_str()).collect();
    assert_eq!(tokens, vec!["r-1", "r-2", "r-3"]);

    let cart_text = sent
        .get(1)
        .and_then(|r| r.messages.first())
        .and_then(Message::as_text)
        .expect("cart text");
    assert!(cart_text.contains("• Rose Noir"));
    assert!(cart_text.contains("รวม 1 รายการ"));

    assert_eq!(
        sent.get(2).map(|r| texts(&r.messages)),
        Some(vec![replies::CART_EMPTY])
    );
}

#[tokio::test]
async fn test_unsupported_events_are_skipped() {
    let app = TestApp::new().await;
    let follow = serde_json::json!({
        "type": "follow",
        "replyToken": "r-0",
        "source": { "type": "user", "userId": "U1" }
    });
    let sticker = serde_json::json!({
        "type": "message",
        "replyToken": "r-1",
        "source": { "type": "user", "userId": "U1" },
        "message": { "id": "9", "type": "sticker", "packageId": "1", "stickerId": "2" }
    });

    app.deliver(&delivery(vec![follow, sticker, text_event("U1", "r-2", "/cart")]))
        .await;

    let sent = app.sender.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent.first().map(|r| r.token.as_str()), Some("r-2"));
}

#[tokio::test]
async fn test_failed_reply_still_records_history() {
    let app = TestApp::new().await;
    app.sender.fail_replies();

    let (status, text) = app
        .deliver(&delivery(vec![text_event("U1", "r-1", "/cart")]))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");

    let turns = app.graph.turns().await;
    assert_eq!(turns.len(), 1);
    assert_eq!(
        turns.first().map(|t| t.bot_message.as_str()),
        Some(replies::CART_SHOWN)
    );
}

#[tokio::test]
async fn test_unknown_postback_is_not_recorded() {
    let app = TestApp::new().await;
    app.deliver(&delivery(vec![postback_event("U1", "r-1", "action=share")]))
        .await;

    let sent = app.sender.sent().await;
    assert_eq!(
        sent.first().map(|r| texts(&r.messages)),
        Some(vec![replies::POSTBACK_UNRECOGNIZED])
    );
    assert!(app.graph.turns().await.is_empty());
}
