//! Shopping cart lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One product in a user's cart, read from an `ADDED_TO_CART` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub title: String,
    pub price: String,
    pub image_url: String,
    pub quantity: u32,
    /// Last time the product was added; `None` if the stored value is unreadable.
    pub added_at: Option<DateTime<Utc>>,
}

impl CartLine {
    /// Total number of items across cart lines.
    #[must_use]
    pub fn total_quantity(lines: &[Self]) -> u64 {
        lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(title: &str, quantity: u32) -> CartLine {
        CartLine {
            title: title.to_string(),
            price: "฿1,000".to_string(),
            image_url: String::new(),
            quantity,
            added_at: None,
        }
    }

    #[test]
    fn test_total_quantity_sums_lines() {
        assert_eq!(CartLine::total_quantity(&[]), 0);
        assert_eq!(
            CartLine::total_quantity(&[line("Rose Noir", 2), line("Ocean Breeze", 1)]),
            3
        );
    }
}
