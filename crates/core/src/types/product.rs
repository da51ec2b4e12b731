//! Product records and the catalog import format.

use serde::{Deserialize, Serialize};

use super::NoteKind;

/// Stock label the catalog uses for unavailable products.
pub const OUT_OF_STOCK: &str = "Temporarily out of stock";

/// Reviews carrying this marker are treated as absent.
const NO_REVIEW: &str = "No Review";

/// A perfume as returned by product queries.
///
/// `title` is the de-facto key: carts, postbacks and detail lookups all
/// reference products by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    pub price: String,
    pub size: String,
    pub image_url: String,
    pub review: Option<String>,
    pub stock: String,
}

impl Product {
    /// The review text, or `None` when the product has no usable review.
    #[must_use]
    pub fn review(&self) -> Option<&str> {
        self.review
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty() && !r.contains(NO_REVIEW))
    }

    /// Whether the stock label marks the product as unavailable.
    #[must_use]
    pub fn is_out_of_stock(&self) -> bool {
        self.stock == OUT_OF_STOCK
    }
}

/// One entry of the catalog JSON file consumed by the importer.
///
/// Key names follow the scraped catalog verbatim, including its mixed
/// casing (`Stock`, `Heart_Note`, `Base Note`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(rename = "Stock", default)]
    pub stock: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub top_note: String,
    #[serde(rename = "Heart_Note", default)]
    pub heart_note: String,
    #[serde(rename = "Base Note", default)]
    pub base_note: String,
}

impl CatalogEntry {
    /// Note description for the given pyramid layer.
    #[must_use]
    pub fn note(&self, kind: NoteKind) -> &str {
        match kind {
            NoteKind::Top => &self.top_note,
            NoteKind::Heart => &self.heart_note,
            NoteKind::Base => &self.base_note,
        }
    }

    /// The product portion of this entry.
    #[must_use]
    pub fn product(&self) -> Product {
        Product {
            title: self.title.clone(),
            price: self.price.clone(),
            size: self.size.clone(),
            image_url: self.image_url.clone(),
            review: self.review.clone(),
            stock: self.stock.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(review: Option<&str>, stock: &str) -> Product {
        Product {
            title: "Rose Noir".to_string(),
            price: "฿3,200".to_string(),
            size: "100ml".to_string(),
            image_url: "https://cdn.example.com/rose-noir.jpg".to_string(),
            review: review.map(String::from),
            stock: stock.to_string(),
        }
    }

    #[test]
    fn test_review_filters_placeholders() {
        assert_eq!(product(Some("4.8/5"), "").review(), Some("4.8/5"));
        assert_eq!(product(Some("No Review"), "").review(), None);
        assert_eq!(product(Some("  "), "").review(), None);
        assert_eq!(product(None, "").review(), None);
    }

    #[test]
    fn test_out_of_stock() {
        assert!(product(None, OUT_OF_STOCK).is_out_of_stock());
        assert!(!product(None, "In stock").is_out_of_stock());
    }

    #[test]
    fn test_catalog_entry_uses_catalog_key_names() {
        let json = r#"{
            "title": "Ocean Breeze",
            "size": "50ml",
            "price": "฿1,900",
            "image_url": "https://cdn.example.com/ocean.jpg",
            "review": "4.5/5",
            "Stock": "In stock",
            "status": "NEW",
            "top_note": "Bergamot",
            "Heart_Note": "Sea salt",
            "Base Note": "Driftwood"
        }"#;

        let entry: CatalogEntry = serde_json::from_str(json).expect("parse entry");
        assert_eq!(entry.stock, "In stock");
        assert_eq!(entry.note(NoteKind::Heart), "Sea salt");
        assert_eq!(entry.note(NoteKind::Base), "Driftwood");
        assert_eq!(entry.product().review(), Some("4.5/5"));
    }

    #[test]
    fn test_catalog_entry_tolerates_missing_optional_keys() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{"title": "Plain"}"#).expect("parse entry");
        assert!(entry.status.is_empty());
        assert!(entry.review.is_none());
    }
}
