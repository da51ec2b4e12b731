//! The closed set of conversational intents.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the user is asking for.
///
/// Declaration order matters: keyword-score ties resolve to the intent
/// declared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    GeneralInquiry,
    ProductBestseller,
    ProductNew,
    ProductReviewed,
    ProductLimited,
    ScentFresh,
    ScentSweet,
    ScentSexy,
    SeasonSummer,
    SeasonWinter,
    OccasionWork,
    OccasionDate,
    OccasionParty,
}

/// Unknown intent label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown intent label: {0}")]
pub struct IntentParseError(pub String);

impl Intent {
    /// Every intent, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Greeting,
        Self::GeneralInquiry,
        Self::ProductBestseller,
        Self::ProductNew,
        Self::ProductReviewed,
        Self::ProductLimited,
        Self::ScentFresh,
        Self::ScentSweet,
        Self::ScentSexy,
        Self::SeasonSummer,
        Self::SeasonWinter,
        Self::OccasionWork,
        Self::OccasionDate,
        Self::OccasionParty,
    ];

    /// Stable snake-case label used in training data and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::GeneralInquiry => "general_inquiry",
            Self::ProductBestseller => "product_bestseller",
            Self::ProductNew => "product_new",
            Self::ProductReviewed => "product_reviewed",
            Self::ProductLimited => "product_limited",
            Self::ScentFresh => "scent_fresh",
            Self::ScentSweet => "scent_sweet",
            Self::ScentSexy => "scent_sexy",
            Self::SeasonSummer => "season_summer",
            Self::SeasonWinter => "season_winter",
            Self::OccasionWork => "occasion_work",
            Self::OccasionDate => "occasion_date",
            Self::OccasionParty => "occasion_party",
        }
    }

    /// Whether this intent is answered with a product search.
    #[must_use]
    pub const fn is_product_query(&self) -> bool {
        self.product().is_some()
    }

    /// The product search this intent asks for, if any.
    #[must_use]
    pub const fn product(&self) -> Option<ProductIntent> {
        Some(match self {
            Self::Greeting | Self::GeneralInquiry => return None,
            Self::ProductBestseller => ProductIntent::Bestseller,
            Self::ProductNew => ProductIntent::New,
            Self::ProductReviewed => ProductIntent::Reviewed,
            Self::ProductLimited => ProductIntent::Limited,
            Self::ScentFresh => ProductIntent::ScentFresh,
            Self::ScentSweet => ProductIntent::ScentSweet,
            Self::ScentSexy => ProductIntent::ScentSexy,
            Self::SeasonSummer => ProductIntent::SeasonSummer,
            Self::SeasonWinter => ProductIntent::SeasonWinter,
            Self::OccasionWork => ProductIntent::OccasionWork,
            Self::OccasionDate => ProductIntent::OccasionDate,
            Self::OccasionParty => ProductIntent::OccasionParty,
        })
    }
}

/// Intents answered with a product search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductIntent {
    Bestseller,
    New,
    Reviewed,
    Limited,
    ScentFresh,
    ScentSweet,
    ScentSexy,
    SeasonSummer,
    SeasonWinter,
    OccasionWork,
    OccasionDate,
    OccasionParty,
}

impl ProductIntent {
    /// Every product intent.
    pub const ALL: [Self; 12] = [
        Self::Bestseller,
        Self::New,
        Self::Reviewed,
        Self::Limited,
        Self::ScentFresh,
        Self::ScentSweet,
        Self::ScentSexy,
        Self::SeasonSummer,
        Self::SeasonWinter,
        Self::OccasionWork,
        Self::OccasionDate,
        Self::OccasionParty,
    ];
}

impl From<ProductIntent> for Intent {
    fn from(intent: ProductIntent) -> Self {
        match intent {
            ProductIntent::Bestseller => Self::ProductBestseller,
            ProductIntent::New => Self::ProductNew,
            ProductIntent::Reviewed => Self::ProductReviewed,
            ProductIntent::Limited => Self::ProductLimited,
            ProductIntent::ScentFresh => Self::ScentFresh,
            ProductIntent::ScentSweet => Self::ScentSweet,
            ProductIntent::ScentSexy => Self::ScentSexy,
            ProductIntent::SeasonSummer => Self::SeasonSummer,
            ProductIntent::SeasonWinter => Self::SeasonWinter,
            ProductIntent::OccasionWork => Self::OccasionWork,
            ProductIntent::OccasionDate => Self::OccasionDate,
            ProductIntent::OccasionParty => Self::OccasionParty,
        }
    }
}

impl std::fmt::Display for ProductIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Intent::from(*self).as_str())
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = IntentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| IntentParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>(), Ok(intent));
        }
    }

    #[test]
    fn test_serde_label_matches_as_str() {
        let json = serde_json::to_string(&Intent::ProductBestseller).expect("serialize");
        assert_eq!(json, "\"product_bestseller\"");
        let json = serde_json::to_string(&Intent::GeneralInquiry).expect("serialize");
        assert_eq!(json, "\"general_inquiry\"");
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = "weather".parse::<Intent>().unwrap_err();
        assert_eq!(err.to_string(), "unknown intent label: weather");
    }

    #[test]
    fn test_product_query_split() {
        let product_intents = Intent::ALL.iter().filter(|i| i.is_product_query()).count();
        assert_eq!(product_intents, 12);
        assert!(!Intent::Greeting.is_product_query());
        assert!(Intent::OccasionParty.is_product_query());
    }

    #[test]
    fn test_product_intent_maps_back() {
        for product in ProductIntent::ALL {
            assert_eq!(Intent::from(product).product(), Some(product));
        }
        assert_eq!(Intent::Greeting.product(), None);
        assert_eq!(ProductIntent::Reviewed.to_string(), "product_reviewed");
    }
}
