//! Postback data carried by card buttons.
//!
//! Format: `action=<verb>&product_id=<index>&title=<url-encoded title>`.
//! Pairs are split on `&`, then on the first `=`; `product_id` is
//! informational and ignored when parsing.

use std::collections::HashMap;

const VIEW_DETAIL: &str = "view_detail";
const ADD_CART: &str = "add_cart";

/// A parsed postback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostbackAction {
    /// Show the detail card for a product.
    ViewDetail { title: String },
    /// Add one unit of a product to the cart.
    AddToCart { title: String },
    /// Unknown verb or missing title.
    Unrecognized { action: Option<String> },
}

impl PostbackAction {
    /// Parse raw postback data.
    #[must_use]
    pub fn parse(data: &str) -> Self {
        let params: HashMap<&str, &str> = data
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .collect();

        let action = params.get("action").copied();
        let title = params
            .get("title")
            .map(|raw| decode(raw))
            .filter(|t| !t.trim().is_empty());

        match (action, title) {
            (Some(VIEW_DETAIL), Some(title)) => Self::ViewDetail { title },
            (Some(ADD_CART), Some(title)) => Self::AddToCart { title },
            (action, _) => Self::Unrecognized {
                action: action.map(String::from),
            },
        }
    }
}

/// Data for a carousel "view detail" button or hero image.
#[must_use]
pub fn view_detail_data(index: usize, title: &str) -> String {
    format!(
        "action={VIEW_DETAIL}&product_id={index}&title={}",
        urlencoding::encode(title)
    )
}

/// Data for an "add to cart" button; the detail card omits the index.
#[must_use]
pub fn add_cart_data(index: Option<usize>, title: &str) -> String {
    let title = urlencoding::encode(title);
    match index {
        Some(index) => format!("action={ADD_CART}&product_id={index}&title={title}"),
        None => format!("action={ADD_CART}&title={title}"),
    }
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |t| t.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_cart() {
        assert_eq!(
            PostbackAction::parse("action=add_cart&title=Rose%20Noir"),
            PostbackAction::AddToCart {
                title: "Rose Noir".to_string()
            }
        );
    }

    #[test]
    fn test_parse_view_detail_with_index() {
        let data = view_detail_data(3, "กุหลาบ & Oud");
        assert_eq!(
            PostbackAction::parse(&data),
            PostbackAction::ViewDetail {
                title: "กุหลาบ & Oud".to_string()
            }
        );
    }

    #[test]
    fn test_value_keeps_later_equals_signs() {
        assert_eq!(
            PostbackAction::parse("action=add_cart&title=a=b"),
            PostbackAction::AddToCart {
                title: "a=b".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            PostbackAction::parse("action=wishlist&title=Rose"),
            PostbackAction::Unrecognized {
                action: Some("wishlist".to_string())
            }
        );
        assert_eq!(
            PostbackAction::parse("garbage"),
            PostbackAction::Unrecognized { action: None }
        );
    }

    #[test]
    fn test_missing_title_is_unrecognized() {
        assert!(matches!(
            PostbackAction::parse("action=view_detail&product_id=0"),
            PostbackAction::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_add_cart_data_formats() {
        assert_eq!(
            add_cart_data(Some(1), "Rose Noir"),
            "action=add_cart&product_id=1&title=Rose%20Noir"
        );
        assert_eq!(
            add_cart_data(None, "Rose Noir"),
            "action=add_cart&title=Rose%20Noir"
        );
    }
}
