//! Product search filters and their Cypher.
//!
//! Every product intent maps to exactly one [`ProductFilter`]. The Neo4j
//! store renders filters to parameterized Cypher; the in-memory store
//! evaluates the same filters directly, so both agree on what matches.

use std::sync::LazyLock;

use perfume_bot_core::{ProductIntent, ProductStatus};
use regex::Regex;

/// Maximum products returned by a search.
pub const SEARCH_LIMIT: i64 = 5;

/// Columns every product query returns.
pub const PRODUCT_COLUMNS: &str = "p.title AS title, p.price AS price, p.size AS size, \
     p.image_url AS image_url, p.review AS review, p.stock AS stock";

// =============================================================================
// Title Keyword Lists
// =============================================================================

/// Title words for one product intent.
///
/// English words are matched against the lowercased title, Thai words
/// against the title as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleKeywords {
    pub english: &'static [&'static str],
    pub thai: &'static [&'static str],
}

impl TitleKeywords {
    /// Whether a product title contains any of the words.
    #[must_use]
    pub fn matches(&self, title: &str) -> bool {
        let lowered = title.to_lowercase();
        self.english.iter().any(|word| lowered.contains(word))
            || self.thai.iter().any(|word| title.contains(word))
    }
}

const FRESH: TitleKeywords = TitleKeywords {
    english: &[
        "fresh", "light", "citrus", "ocean", "clean", "cool", "aqua", "blue", "mint", "green",
    ],
    thai: &["สดชื่น", "เซฟ", "เบา", "ใส", "น้ำใส", "ทะเล", "เย็น", "สด"],
};

const SWEET: TitleKeywords = TitleKeywords {
    english: &[
        "sweet", "vanilla", "floral", "rose", "flower", "pink", "cherry", "peach",
    ],
    thai: &["หวาน", "ดอกไม้", "กุหลาบ", "หอม", "วานิลลา", "ชมพู"],
};

const SEXY: TitleKeywords = TitleKeywords {
    english: &[
        "intense", "black", "noir", "dark", "deep", "red", "sexy", "seductive",
    ],
    thai: &["เซ็กซี่", "ดำ", "เข้ม", "แรง", "ดึงดูด", "แดง"],
};

const SUMMER: TitleKeywords = TitleKeywords {
    english: &[
        "fresh", "light", "citrus", "ocean", "cool", "aqua", "blue", "summer", "mint", "ice",
    ],
    thai: &["สดชื่น", "เซฟ", "เบา", "ร้อน", "เย็น", "สด"],
};

const WINTER: TitleKeywords = TitleKeywords {
    english: &[
        "warm", "intense", "rich", "deep", "dark", "winter", "spice", "wood",
    ],
    thai: &["อุ่น", "เข้ม", "หนาว", "แรง", "เครื่องเทศ", "ไม้"],
};

const WORK: TitleKeywords = TitleKeywords {
    english: &[
        "light",
        "fresh",
        "clean",
        "subtle",
        "office",
        "work",
        "professional",
        "classic",
    ],
    thai: &["เบา", "เซฟ", "ทำงาน", "ออฟฟิศ", "เรียบร้อย", "สุภาพ"],
};

const DATE: TitleKeywords = TitleKeywords {
    english: &[
        "romance", "love", "sexy", "seductive", "date", "heart", "passion", "charm",
    ],
    thai: &["โรแมนติก", "รัก", "เดท", "หัวใจ", "ดึงดูด", "เสน่ห์"],
};

const PARTY: TitleKeywords = TitleKeywords {
    english: &[
        "intense",
        "bold",
        "strong",
        "party",
        "night",
        "club",
        "celebration",
        "festive",
    ],
    thai: &["ปาร์ตี้", "แรง", "เลี้ยง", "กลางคืน", "สนุก", "เฟส"],
};

// =============================================================================
// Review Ranking
// =============================================================================

/// Review rating buckets, in the order they are tested.
const REVIEW_BUCKETS: [(&str, f64); 4] = [
    (r"5(\.0)?/5", 5.0),
    (r"4\.[5-9]/5", 4.7),
    (r"4\.[0-4]/5", 4.2),
    (r"3\.[5-9]/5", 3.7),
];

static REVIEW_BUCKET_PATTERNS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    REVIEW_BUCKETS
        .iter()
        .filter_map(|(pattern, rank)| {
            Regex::new(&format!("^(?:{pattern})$"))
                .ok()
                .map(|re| (re, *rank))
        })
        .collect()
});

static DIGIT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new("[0-9]").ok());

/// Sort key for a review string; the whole string must match a bucket.
#[must_use]
pub fn review_rank(review: &str) -> f64 {
    REVIEW_BUCKET_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(review))
        .map_or(0.0, |(_, rank)| *rank)
}

/// Whether a review counts as a real review for the "well reviewed" search.
#[must_use]
pub fn is_rated_review(review: Option<&str>) -> bool {
    let Some(review) = review else {
        return false;
    };
    !review.is_empty()
        && !review.contains("No Review")
        && DIGIT.as_ref().is_some_and(|digit| digit.is_match(review))
}

fn review_rank_cypher() -> String {
    let cases: String = REVIEW_BUCKETS
        .iter()
        .map(|(pattern, rank)| {
            format!(
                " WHEN p.review =~ '{}' THEN {rank:.1}",
                pattern.replace('\\', "\\\\")
            )
        })
        .collect();
    format!("CASE{cases} ELSE 0.0 END")
}

// =============================================================================
// Filters
// =============================================================================

/// A product search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductFilter {
    /// First products in storage order.
    Any,
    /// Products carrying a status.
    Status(ProductStatus),
    /// Products with a numeric review, best bucket first.
    WellReviewed,
    /// Products whose title contains one of the words.
    Title(TitleKeywords),
    /// Used when a search returns nothing: reviews in descending order.
    MostReviewed,
}

impl ProductFilter {
    /// The search answering a product intent; `None` lists any products.
    #[must_use]
    pub const fn for_intent(intent: Option<ProductIntent>) -> Self {
        let Some(intent) = intent else {
            return Self::Any;
        };
        match intent {
            ProductIntent::Bestseller => Self::Status(ProductStatus::Bestseller),
            ProductIntent::New => Self::Status(ProductStatus::New),
            ProductIntent::Limited => Self::Status(ProductStatus::LimitedEdition),
            ProductIntent::Reviewed => Self::WellReviewed,
            ProductIntent::ScentFresh => Self::Title(FRESH),
            ProductIntent::ScentSweet => Self::Title(SWEET),
            ProductIntent::ScentSexy => Self::Title(SEXY),
            ProductIntent::SeasonSummer => Self::Title(SUMMER),
            ProductIntent::SeasonWinter => Self::Title(WINTER),
            ProductIntent::OccasionWork => Self::Title(WORK),
            ProductIntent::OccasionDate => Self::Title(DATE),
            ProductIntent::OccasionParty => Self::Title(PARTY),
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Status(_) => "status",
            Self::WellReviewed => "well_reviewed",
            Self::Title(_) => "title_keywords",
            Self::MostReviewed => "most_reviewed",
        }
    }

    /// Cypher for this filter. Parameters are listed by [`Self::cypher_params`].
    #[must_use]
    pub fn cypher(&self) -> String {
        match self {
            Self::Any => format!("MATCH (p:Product) RETURN {PRODUCT_COLUMNS} LIMIT $limit"),
            Self::Status(_) => format!(
                "MATCH (p:Product)-[:HAS_STATUS]->(:Status {{name: $status}}) \
                 RETURN {PRODUCT_COLUMNS} LIMIT $limit"
            ),
            Self::WellReviewed => format!(
                "MATCH (p:Product) \
                 WHERE p.review IS NOT NULL AND p.review <> '' \
                 AND NOT p.review CONTAINS 'No Review' \
                 AND p.review =~ '.*[0-9]+.*' \
                 RETURN {PRODUCT_COLUMNS} \
                 ORDER BY {} DESC LIMIT $limit",
                review_rank_cypher()
            ),
            Self::Title(_) => format!(
                "MATCH (p:Product) \
                 WHERE any(word IN $english WHERE toLower(p.title) CONTAINS word) \
                 OR any(word IN $thai WHERE p.title CONTAINS word) \
                 RETURN {PRODUCT_COLUMNS} LIMIT $limit"
            ),
            Self::MostReviewed => format!(
                "MATCH (p:Product) RETURN {PRODUCT_COLUMNS} ORDER BY p.review DESC LIMIT $limit"
            ),
        }
    }

    /// Names of the parameters [`Self::cypher`] expects besides `limit`.
    #[must_use]
    pub const fn cypher_params(&self) -> &'static [&'static str] {
        match self {
            Self::Status(_) => &["status"],
            Self::Title(_) => &["english", "thai"],
            Self::Any | Self::WellReviewed | Self::MostReviewed => &[],
        }
    }
}

// =============================================================================
// Title Lookup
// =============================================================================

/// How a title lookup compares titles. Tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleMatch {
    Exact,
    CaseInsensitive,
    Contains,
}

impl TitleMatch {
    pub const ORDER: [Self; 3] = [Self::Exact, Self::CaseInsensitive, Self::Contains];

    /// Whether a stored title satisfies this comparison for `wanted`.
    #[must_use]
    pub fn matches(&self, stored: &str, wanted: &str) -> bool {
        match self {
            Self::Exact => stored == wanted,
            Self::CaseInsensitive => stored.to_lowercase() == wanted.to_lowercase(),
            Self::Contains => {
                stored.contains(wanted) || stored.to_lowercase().contains(&wanted.to_lowercase())
            }
        }
    }

    #[must_use]
    pub fn cypher(&self) -> String {
        let condition = match self {
            Self::Exact => "p.title = $title",
            Self::CaseInsensitive => "toLower(p.title) = toLower($title)",
            Self::Contains => "p.title CONTAINS $title OR toLower(p.title) CONTAINS toLower($title)",
        };
        format!("MATCH (p:Product) WHERE {condition} RETURN {PRODUCT_COLUMNS} LIMIT 1")
    }
}
