//! Keyword scoring over normalized text.

use perfume_bot_core::Intent;

use super::TextNormalizer;

/// Keywords per intent, as customers type them.
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Greeting, &["สวัสดี", "หวัดดี", "ไง", "hello", "hi", "hey"]),
    (
        Intent::GeneralInquiry,
        &[
            "มีอะไรคุย",
            "รู้อะไรบ้าง",
            "ช่วยแนะนำ",
            "แนะนำ",
            "recommend",
            "suggestion",
            "น่าสนใจ",
            "interesting",
        ],
    ),
    (
        Intent::ProductBestseller,
        &["ขายดี", "bestseller", "ยอดนิยม", "popular", "best seller", "best-seller"],
    ),
    (Intent::ProductNew, &["ใหม่", "new", "มาใหม่", "latest", "newest"]),
    (
        Intent::ProductReviewed,
        &["รีวิว", "review", "รีวิวดี", "good review", "มีรีวิว", "reviewed"],
    ),
    (
        Intent::ProductLimited,
        &["limited", "ลิมิเต็ด", "limited edition", "พิเศษ", "exclusive"],
    ),
    (
        Intent::ScentFresh,
        &["สดชื่น", "fresh", "เซฟ", "safe", "เบา", "light", "น่าสนใจ", "ใส", "clean"],
    ),
    (
        Intent::ScentSweet,
        &["หวาน", "sweet", "หอมหวาน", "floral", "ดอกไม้", "flower", "กุหลาบ", "rose"],
    ),
    (
        Intent::ScentSexy,
        &["เซ็กซี่", "sexy", "ดึงดูด", "attractive", "เข้ม", "intense", "แรง", "strong"],
    ),
    (
        Intent::SeasonSummer,
        &["หน้าร้อน", "summer", "ร้อน", "hot", "เย็น", "cool", "ฤดูร้อน"],
    ),
    (
        Intent::SeasonWinter,
        &["หน้าหนาว", "winter", "หนาว", "cold", "อุ่น", "warm", "ฤดูหนาว"],
    ),
    (
        Intent::OccasionWork,
        &["ทำงาน", "work", "ออฟฟิศ", "office", "การทำงาน", "working"],
    ),
    (
        Intent::OccasionDate,
        &["เดท", "date", "โรแมนติก", "romantic", "รัก", "love"],
    ),
    (
        Intent::OccasionParty,
        &["ปาร์ตี้", "party", "งานเลี้ยง", "celebration", "กลางคืน", "night"],
    ),
];

/// Best keyword match for a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordMatch {
    pub intent: Intent,
    /// Number of the intent's keywords found in the text.
    pub score: usize,
    /// Number of keywords declared for the intent, before normalization
    /// merges synonyms.
    pub total: usize,
}

impl KeywordMatch {
    /// Share of the intent's keywords present in the text.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // keyword counts are tiny
    pub fn confidence(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.score as f64 / self.total as f64
    }
}

/// Intent keyword table, stored in normalized form.
///
/// Keywords go through the same normalizer as messages, so `"fresh"` and
/// `"สดชื่น"` collapse into one entry and every keyword matches a message
/// consisting of that keyword alone. Confidence still divides by the
/// declared keyword count.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<KeywordEntry>,
}

#[derive(Debug, Clone)]
struct KeywordEntry {
    intent: Intent,
    keywords: Vec<String>,
    declared: usize,
}

impl KeywordTable {
    /// Build the table from the built-in keyword lists.
    #[must_use]
    pub fn new(normalizer: &TextNormalizer) -> Self {
        let entries = INTENT_KEYWORDS
            .iter()
            .map(|(intent, keywords)| {
                let mut normalized: Vec<String> = Vec::with_capacity(keywords.len());
                for keyword in *keywords {
                    let keyword = normalizer.normalize(keyword);
                    if !keyword.is_empty() && !normalized.contains(&keyword) {
                        normalized.push(keyword);
                    }
                }
                KeywordEntry {
                    intent: *intent,
                    keywords: normalized,
                    declared: keywords.len(),
                }
            })
            .collect();

        Self { entries }
    }

    /// Normalized keywords for an intent.
    #[must_use]
    pub fn keywords(&self, intent: Intent) -> &[String] {
        self.entries
            .iter()
            .find(|entry| entry.intent == intent)
            .map_or(&[], |entry| entry.keywords.as_slice())
    }

    /// Score every intent and return the best non-zero match.
    ///
    /// Ties prefer product-search intents over greeting and general
    /// inquiry, then declaration order.
    #[must_use]
    pub fn best_match(&self, normalized_text: &str) -> Option<KeywordMatch> {
        let mut best: Option<KeywordMatch> = None;

        for entry in &self.entries {
            let score = entry
                .keywords
                .iter()
                .filter(|keyword| normalized_text.contains(keyword.as_str()))
                .count();
            if score == 0 {
                continue;
            }

            let candidate = KeywordMatch {
                intent: entry.intent,
                score,
                total: entry.declared,
            };

            best = match best {
                None => Some(candidate),
                Some(current) if candidate.score > current.score => Some(candidate),
                Some(current)
                    if candidate.score == current.score
                        && candidate.intent.is_product_query()
                        && !current.intent.is_product_query() =>
                {
                    Some(candidate)
                }
                Some(current) => Some(current),
            };
        }

        best
    }

    /// Intents with at least one keyword in the text, in declaration order.
    #[must_use]
    pub fn matching_intents(&self, normalized_text: &str) -> Vec<Intent> {
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .keywords
                    .iter()
                    .any(|keyword| normalized_text.contains(keyword.as_str()))
            })
            .map(|entry| entry.intent)
            .collect()
    }
}
