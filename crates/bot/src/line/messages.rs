//! Message builders for product replies.
//!
//! Provides factory functions for:
//! - The product carousel shown for recommendation intents
//! - The single-product detail card
//! - The quick-reply buttons attached to the general inquiry answer

use perfume_bot_core::Product;

use super::postback::{add_cart_data, view_detail_data};
use super::types::{
    Action, Bubble, ButtonStyle, Carousel, Component, FlexBox, FlexButton, FlexContainer,
    FlexImage, FlexText, Layout, Message, QuickReply, QuickReplyItem,
};

/// Alt text shown in notifications for the carousel.
pub const CAROUSEL_ALT_TEXT: &str = "Product Catalog";

/// Text sent by the detail card's "see other products" button.
pub const BROWSE_MORE_TEXT: &str = "แนะนำสินค้าอื่น";

const RED: &str = "#ff5551";
const GREEN: &str = "#00AA00";
const GREY: &str = "#8c8c8c";
const LABEL_GREY: &str = "#aaaaaa";
const VALUE_GREY: &str = "#666666";

/// Quick replies offered with the general inquiry answer: (label, text sent).
const INQUIRY_SHORTCUTS: [(&str, &str); 5] = [
    ("🌟 BEST SELLER", "สินค้าขายดี"),
    ("🆕 NEW", "สินค้าใหม่"),
    ("💬 มีรีวิว", "สินค้าที่มีรีวิว"),
    ("🌿 กลิ่นสดชื่น", "แนะนำกลิ่นสดชื่น"),
    ("🛒 ตะกร้า", "/cart"),
];

/// Build a text message with the general inquiry quick replies.
#[must_use]
pub fn text_with_shortcuts(text: impl Into<String>) -> Message {
    Message::Text {
        text: text.into(),
        quick_reply: Some(general_inquiry_quick_replies()),
    }
}

/// Quick-reply buttons for browsing the catalog.
#[must_use]
pub fn general_inquiry_quick_replies() -> QuickReply {
    QuickReply {
        items: INQUIRY_SHORTCUTS
            .iter()
            .map(|(label, text)| QuickReplyItem::Action {
                action: Action::message(*label, *text),
            })
            .collect(),
    }
}

/// Build a carousel with one bubble per product.
///
/// Each bubble has:
/// - Hero image opening the detail card
/// - Title, size, review, price and stock lines
/// - "view detail" and "add to cart" buttons
#[must_use]
pub fn build_product_carousel(products: &[Product]) -> Message {
    let bubbles = products
        .iter()
        .enumerate()
        .map(|(i, product)| carousel_bubble(i, product))
        .collect();

    Message::Flex {
        alt_text: CAROUSEL_ALT_TEXT.to_string(),
        contents: FlexContainer::Carousel(Carousel { contents: bubbles }),
    }
}

fn carousel_bubble(index: usize, product: &Product) -> Bubble {
    let detail = view_detail_data(index, &product.title);

    let (review_text, review_color) = product
        .review()
        .map_or(("No Review", RED), |review| (review, GREEN));

    let body = FlexBox::new(
        Layout::Vertical,
        vec![
            Component::Text(FlexText::new(&product.title).wrap().bold().size("xl")),
            baseline(
                FlexText::new(format!("Size: {}", product.size))
                    .wrap()
                    .bold()
                    .size("xs")
                    .color(GREY)
                    .flex(0),
            ),
            baseline(
                FlexText::new(format!("⭐ {review_text}"))
                    .wrap()
                    .bold()
                    .size("sm")
                    .color(review_color)
                    .flex(0),
            ),
            baseline(
                FlexText::new(format!("💰 {}", product.price))
                    .wrap()
                    .bold()
                    .size("lg")
                    .color(RED)
                    .flex(0),
            ),
            Component::Text(
                FlexText::new(format!("📦 {}", product.stock))
                    .wrap()
                    .size("xxs")
                    .margin("md")
                    .color(stock_color(product))
                    .flex(0),
            ),
        ],
    )
    .spacing("sm");

    let footer = FlexBox::new(
        Layout::Vertical,
        vec![
            button(
                ButtonStyle::Primary,
                Action::postback("📋 ดูรายละเอียด", detail.clone()),
            ),
            button(
                ButtonStyle::Secondary,
                Action::postback(
                    "🛒 Add to Cart",
                    add_cart_data(Some(index), &product.title),
                ),
            ),
        ],
    )
    .spacing("sm");

    Bubble {
        hero: hero(
            product,
            Some(Action::Postback {
                label: None,
                data: detail,
            }),
        ),
        body: Some(Component::Box(body)),
        footer: Some(Component::Box(footer)),
    }
}

/// Build the detail card for one product.
#[must_use]
pub fn build_product_detail(product: &Product) -> Message {
    let (review_text, review_color) = product
        .review()
        .map_or(("ยังไม่มีรีวิว", RED), |review| (review, GREEN));

    let rows = FlexBox::new(
        Layout::Vertical,
        vec![
            detail_row(
                "💰 ราคา",
                FlexText::new(&product.price).color(RED).size("lg").bold(),
            ),
            detail_row(
                "📏 ขนาด",
                FlexText::new(&product.size).color(VALUE_GREY).size("md"),
            ),
            detail_row(
                "⭐ รีวิว",
                FlexText::new(review_text).color(review_color).size("md").bold(),
            ),
            detail_row(
                "📦 สต็อก",
                FlexText::new(&product.stock)
                    .color(stock_color(product))
                    .size("md")
                    .bold(),
            ),
        ],
    )
    .margin("lg")
    .spacing("sm");

    let body = FlexBox::new(
        Layout::Vertical,
        vec![
            Component::Text(FlexText::new(&product.title).bold().size("xl").wrap()),
            Component::Separator {
                margin: Some("md".to_string()),
            },
            Component::Box(rows),
        ],
    );

    let footer = FlexBox::new(
        Layout::Vertical,
        vec![
            button(
                ButtonStyle::Primary,
                Action::postback("🛒 เพิ่มในตะกร้า", add_cart_data(None, &product.title)),
            ),
            button(
                ButtonStyle::Secondary,
                Action::message("🔍 ดูสินค้าอื่น", BROWSE_MORE_TEXT),
            ),
        ],
    )
    .spacing("sm");

    Message::Flex {
        alt_text: format!("รายละเอียด {}", product.title),
        contents: FlexContainer::Bubble(Bubble {
            hero: hero(product, None),
            body: Some(Component::Box(body)),
            footer: Some(Component::Box(footer)),
        }),
    }
}

/// Full-width cover image. LINE rejects empty image URLs, so products
/// without one get no hero.
fn hero(product: &Product, action: Option<Action>) -> Option<Component> {
    if product.image_url.trim().is_empty() {
        return None;
    }
    Some(Component::Image(FlexImage {
        url: product.image_url.clone(),
        size: "full".to_string(),
        aspect_ratio: "20:13".to_string(),
        aspect_mode: "cover".to_string(),
        action,
    }))
}

fn baseline(text: FlexText) -> Component {
    Component::Box(FlexBox::new(Layout::Baseline, vec![Component::Text(text)]))
}

fn detail_row(label: &str, value: FlexText) -> Component {
    Component::Box(
        FlexBox::new(
            Layout::Baseline,
            vec![
                Component::Text(FlexText::new(label).color(LABEL_GREY).size("sm").flex(1)),
                Component::Text(value.wrap().flex(2)),
            ],
        )
        .spacing("sm"),
    )
}

fn button(style: ButtonStyle, action: Action) -> Component {
    Component::Button(FlexButton { style, action })
}

fn stock_color(product: &Product) -> &'static str {
    if product.is_out_of_stock() { RED } else { GREEN }
}
