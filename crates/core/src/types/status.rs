//! Catalog status and fragrance note classifications.

use serde::{Deserialize, Serialize};

/// Merchandising status a product can be linked to via `HAS_STATUS`.
///
/// The catalog may carry other free-form status names; these are the ones
/// the chatbot queries by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductStatus {
    #[serde(rename = "BESTSELLER")]
    Bestseller,
    #[serde(rename = "NEW")]
    New,
    #[serde(rename = "Limited Edition")]
    LimitedEdition,
}

impl ProductStatus {
    /// Status node name as stored in the graph.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bestseller => "BESTSELLER",
            Self::New => "NEW",
            Self::LimitedEdition => "Limited Edition",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three layers of a fragrance pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    Top,
    Heart,
    Base,
}

impl NoteKind {
    /// All note kinds, in pyramid order.
    pub const ALL: [Self; 3] = [Self::Top, Self::Heart, Self::Base];

    /// Value of the `type` property on a `Note` node.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Top => "Top Note",
            Self::Heart => "Heart Note",
            Self::Base => "Base Note",
        }
    }

    /// Relationship type linking a product to a note of this kind.
    #[must_use]
    pub const fn relationship(&self) -> &'static str {
        match self {
            Self::Top => "HAS_TOP_NOTE",
            Self::Heart => "HAS_HEART_NOTE",
            Self::Base => "HAS_BASE_NOTE",
        }
    }
}
