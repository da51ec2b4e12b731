//! Thai/English text normalization.
//!
//! Messages arrive as a mix of Thai and English ("ขอ perfume fresh หน่อยครับ").
//! Normalization folds them into one vocabulary so keyword scoring and the
//! classifier see the same tokens regardless of which language the customer
//! typed:
//!
//! 1. lowercase, trim and collapse whitespace
//! 2. NFC canonical composition
//! 3. English synonyms replaced by their Thai equivalents
//! 4. common spelling variants collapsed
//! 5. honorific and filler particles stripped
//! 6. whitespace collapsed again
//!
//! The pass is repeated until the output stops changing, so normalizing an
//! already normalized string is a no-op.

use unicode_normalization::UnicodeNormalization;

/// English words customers mix into Thai messages, in replacement order.
const MIXED_WORDS: &[(&str, &str)] = &[
    ("perfume", "น้ำหอม"),
    ("review", "รีวิว"),
    ("recommend", "แนะนำ"),
    ("new", "ใหม่"),
    ("bestseller", "ขายดี"),
    ("fresh", "สดชื่น"),
    ("sweet", "หวาน"),
    ("sexy", "เซ็กซี่"),
    ("light", "เบา"),
    ("summer", "หน้าร้อน"),
    ("winter", "หน้าหนาว"),
    ("work", "ทำงาน"),
    ("office", "ออฟฟิศ"),
    ("date", "เดท"),
    ("party", "ปาร์ตี้"),
    ("limited", "ลิมิเต็ด"),
    ("edition", "อิดิชั่น"),
    ("price", "ราคา"),
    ("size", "ขนาด"),
    ("stock", "สต็อก"),
    ("cool", "เย็น"),
    ("warm", "อุ่น"),
    ("romantic", "โรแมนติก"),
    ("intense", "เข้ม"),
    ("black", "ดำ"),
    ("blue", "น้ำเงิน"),
    ("red", "แดง"),
    ("pink", "ชมพู"),
    ("love", "รัก"),
    ("heart", "หัวใจ"),
    ("flower", "ดอกไม้"),
    ("rose", "กุหลาบ"),
    ("vanilla", "วานิลลา"),
    ("citrus", "ส้ม"),
    ("ocean", "ทะเล"),
    ("night", "กลางคืน"),
    ("morning", "เช้า"),
    ("evening", "เย็น"),
];

/// Spelling variants and stock phrases, in replacement order.
///
/// A variant containing another variant comes first.
const SPELLING_VARIANTS: &[(&str, &str)] = &[
    ("สวัสดีครับ", "สวัสดี"),
    ("สวัสดีค่ะ", "สวัสดี"),
    ("ขอโทษครับ", "ขอโทษ"),
    ("ขอโทษค่ะ", "ขอโทษ"),
    ("ช่วยแนะนำหน่อย", "แนะนำ"),
    ("แนะนำหน่อย", "แนะนำ"),
    ("มีอะไรน่าสนใจบ้าง", "น่าสนใจ"),
    ("มีอะไรน่าสนใจช่วงนี้", "น่าสนใจ"),
    ("กลิ่นไหนเหมาะกับหน้าร้อน", "หน้าร้อน"),
    ("น้ำหอมไหนดี", "แนะนำ"),
    ("perfumeไหนดี", "แนะนำ"),
    ("reviewดี", "รีวิวดี"),
    ("รีวิวดีๆ", "รีวิวดี"),
    ("ขายดีๆ", "ขายดี"),
    ("ใหม่ๆ", "ใหม่"),
    ("สดชื่นๆ", "สดชื่น"),
    ("หวานๆ", "หวาน"),
    ("เซ็กซี่ๆ", "เซ็กซี่"),
];

/// Politeness particles and fillers that carry no intent.
const PARTICLES: &[&str] = &["ครับ", "ค่ะ", "คะ", "นะ", "หน่อย", "บ้าง", "เอ่อ", "อืม"];

/// Upper bound on normalization passes before giving up on a fixed point.
const MAX_PASSES: usize = 8;

/// Normalizes mixed Thai/English chat messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a normalizer using the built-in tables.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Normalize a message. Never fails; may return an empty string.
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        let mut current = single_pass(text);
        for _ in 1..MAX_PASSES {
            let next = single_pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

fn single_pass(text: &str) -> String {
    let collapsed = collapse_whitespace(&text.to_lowercase());
    // Canonical only: compatibility forms would split SARA AM (ำ) into
    // NIKHAHIT + SARA AA and no table key would match.
    let mut normalized = collapsed.nfc().collect::<String>();

    for (english, thai) in MIXED_WORDS {
        if normalized.contains(english) {
            normalized = normalized.replace(english, thai);
        }
    }

    for (variant, canonical) in SPELLING_VARIANTS {
        if normalized.contains(variant) {
            normalized = normalized.replace(variant, canonical);
        }
    }

    let stripped: Vec<&str> = normalized
        .split_whitespace()
        .map(strip_particles)
        .filter(|token| !token.is_empty())
        .collect();

    stripped.join(" ")
}

/// Remove particles that form a whole token or trail it.
///
/// Thai words are not space-delimited, so particles are only stripped from
/// the end of a token; a particle spelled inside a word (`นะ` in `แนะนำ`,
/// `คะ` in `คะแนน`) is part of that word.
fn strip_particles(token: &str) -> &str {
    let mut rest = token;
    while let Some(shorter) = PARTICLES
        .iter()
        .find_map(|particle| rest.strip_suffix(particle))
    {
        rest = shorter;
    }
    rest
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
