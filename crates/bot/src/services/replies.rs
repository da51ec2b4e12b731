//! Canned reply texts.

use std::fmt::Write as _;

use perfume_bot_core::{CartLine, Intent};

/// Reply when the intent is not recognised.
pub const NOT_UNDERSTOOD: &str =
    "ขอโทษค่ะ ฉันไม่เข้าใจคำถามของคุณ กรุณาลองถามใหม่หรือเลือกจากตัวเลือกที่มีค่ะ";

/// Reply when nothing in the message points at an intent.
pub const HELP_TEXT: &str = "ขอโทษค่ะ ฉันไม่เข้าใจคำถามของคุณ\nลองถาม 'แนะนำ perfume' หรือ 'ขอ review ดีๆ' ดูค่ะ 😊\n\nหรือดูตะกร้าสินค้า: /cart";

pub const CART_EMPTY: &str =
    "🛒 ตะกร้าสินค้าของคุณว่างเปล่าค่ะ\nลองเลือกสินค้าจากรายการแนะนำดูค่ะ";

pub const CHECKOUT_EMPTY: &str = "ตะกร้าสินค้าของคุณว่างเปล่าค่ะ กรุณาเลือกสินค้าก่อน";

pub const CHECKOUT_STEPS: &str = "💳 ขั้นตอนการสั่งซื้อ:\n\n\
1. ตรวจสอบรายการสินค้า ✅\n\
2. กรอกข้อมูลจัดส่ง 📋\n\
3. เลือกวิธีการชำระเงิน 💰\n\
4. ยืนยันการสั่งซื้อ ✅\n\n\
📞 ติดต่อทีมขาย: 02-xxx-xxxx\n\
💬 LINE: @perfumeshop";

pub const CART_CLEARED: &str = "🗑️ ล้างตะกร้าสินค้าเรียบร้อยแล้วค่ะ";

pub const POSTBACK_UNRECOGNIZED: &str = "ขอโทษค่ะ ไม่เข้าใจคำสั่งที่เลือก";

pub const PROCESSING_FAILED: &str =
    "ขอโทษค่ะ เกิดข้อผิดพลาดในการประมวลผล กรุณาลองใหม่อีกครั้ง";

// History summaries stored in place of rich replies.
pub const CART_SHOWN: &str = "แสดงตะกร้าสินค้า";
pub const CHECKOUT_STARTED: &str = "เริ่มกระบวนการสั่งซื้อ";
pub const CART_CLEARED_SUMMARY: &str = "ล้างตะกร้าสินค้า";

/// Intro text for an intent.
#[must_use]
pub const fn intent_reply(intent: Intent) -> &'static str {
    match intent {
        Intent::Greeting => "สวัสดีค่ะ! ยินดีให้คำแนะนำเรื่องน้ำหอม (perfume) ค่ะ 🌸",
        Intent::GeneralInquiry => {
            "ฉันสามารถแนะนำน้ำหอมตามความต้องการของคุณได้ค่ะ เช่น กลิ่นสดชื่น (fresh) กลิ่นหวาน (sweet) หรือตามโอกาสใช้งานค่ะ"
        }
        Intent::ScentFresh => "แนะนำน้ำหอมกลิ่นสดชื่น (Fresh Scent) สำหรับคุณค่ะ: 🌿",
        Intent::ScentSweet => "แนะนำน้ำหอมกลิ่นหวาน (Sweet Scent) สำหรับคุณค่ะ: 🌸",
        Intent::ScentSexy => "แนะนำน้ำหอมกลิ่นเซ็กซี่ (Sexy Scent) สำหรับคุณค่ะ: 🔥",
        Intent::SeasonSummer => "แนะนำน้ำหอมสำหรับหน้าร้อน (Summer Perfume) ค่ะ: ☀️",
        Intent::SeasonWinter => "แนะนำน้ำหอมสำหรับหน้าหนาว (Winter Perfume) ค่ะ: ❄️",
        Intent::OccasionWork => "แนะนำน้ำหอมสำหรับใส่ทำงาน (Office Perfume) ค่ะ: 💼",
        Intent::OccasionDate => "แนะนำน้ำหอมสำหรับไปเดท (Date Perfume) ค่ะ: 💕",
        Intent::OccasionParty => "แนะนำน้ำหอมสำหรับงานปาร์ตี้ (Party Perfume) ค่ะ: 🎉",
        Intent::ProductBestseller => "แนะนำน้ำหอม Bestseller ขายดีสำหรับคุณค่ะ: ⭐",
        Intent::ProductNew => "แนะนำน้ำหอมใหม่ (New Arrivals) สำหรับคุณค่ะ: ✨",
        Intent::ProductReviewed => "แนะนำน้ำหอมที่มี Review ดีสำหรับคุณค่ะ: 👍",
        Intent::ProductLimited => "แนะนำน้ำหอม Limited Edition สำหรับคุณค่ะ: 💎",
    }
}

/// History summary for a carousel reply.
#[must_use]
pub fn carousel_summary(intro: &str, count: usize) -> String {
    format!("{intro} (ส่ง Flex Message แสดง {count} รายการ)")
}

/// Reply when an intent query and its fallback both come back empty.
#[must_use]
pub fn no_products_for(message: &str) -> String {
    format!("ขอโทษค่ะ ไม่พบสินค้าที่ตรงกับ '{message}' ลองใช้คำค้นหาอื่นดูค่ะ")
}

/// "Did you mean" reply built from up to two intents.
#[must_use]
pub fn suggestions(intents: &[Intent]) -> Option<String> {
    let replies: Vec<&str> = intents.iter().take(2).map(|i| intent_reply(*i)).collect();
    if replies.is_empty() {
        return None;
    }
    Some(format!("คุณหมายถึง: {} ใช่ไหมคะ?", replies.join(", ")))
}

/// Cart contents, or [`CART_EMPTY`].
#[must_use]
pub fn cart_summary(lines: &[CartLine]) -> String {
    if lines.is_empty() {
        return CART_EMPTY.to_string();
    }

    let mut text = String::from("🛒 ตะกร้าสินค้าของคุณ:\n\n");
    for line in lines {
        let _ = write!(
            text,
            "• {}\n  จำนวน: {} ชิ้น\n  ราคา: {}\n\n",
            line.title, line.quantity, line.price
        );
    }
    let _ = write!(
        text,
        "รวม {} รายการ\n\n💳 สั่งซื้อ: พิมพ์ '/checkout'\n🗑️ ล้างตะกร้า: พิมพ์ '/clear_cart'",
        CartLine::total_quantity(lines)
    );
    text
}

/// Checkout steps, or [`CHECKOUT_EMPTY`].
#[must_use]
pub const fn checkout(has_items: bool) -> &'static str {
    if has_items { CHECKOUT_STEPS } else { CHECKOUT_EMPTY }
}

#[must_use]
pub fn added_to_cart(title: &str) -> String {
    format!(
        "✅ เพิ่ม '{title}' ลงในตะกร้าแล้วค่ะ!\n\n🛒 ดูตะกร้าสินค้า: /cart\n💳 สั่งซื้อ: /checkout\n🔍 ดูสินค้าอื่น: พิมพ์ 'แนะนำ'"
    )
}

#[must_use]
pub fn added_to_cart_summary(title: &str) -> String {
    format!("เพิ่ม {title} ลงในตะกร้า")
}

#[must_use]
pub fn detail_summary(title: &str) -> String {
    format!("แสดงรายละเอียดสินค้า: {title}")
}

#[must_use]
pub fn detail_not_found(title: &str) -> String {
    format!("ขอโทษค่ะ ไม่พบข้อมูลรายละเอียดของสินค้า '{title}'")
}

#[must_use]
pub fn title_not_found(title: &str) -> String {
    format!("ไม่พบสินค้าที่ชื่อ '{title}'")
}

#[must_use]
pub fn title_lookup_failed(title: &str) -> String {
    format!("เกิดข้อผิดพลาดในการค้นหาสินค้า '{title}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(title: &str, price: &str, quantity: u32) -> CartLine {
        CartLine {
            title: title.to_string(),
            price: price.to_string(),
            image_url: String::new(),
            quantity,
            added_at: None,
        }
    }

    #[test]
    fn test_every_intent_has_a_reply() {
        for intent in Intent::ALL {
            assert!(!intent_reply(intent).is_empty(), "{intent}");
        }
    }

    #[test]
    fn test_cart_summary_sums_quantities() {
        let text = cart_summary(&[
            line("Rose Noir", "฿3,200", 2),
            line("Amber Night", "฿2,900", 1),
        ]);
        assert!(text.starts_with("🛒 ตะกร้าสินค้าของคุณ:\n\n• Rose Noir\n  จำนวน: 2 ชิ้น\n  ราคา: ฿3,200\n\n"));
        assert!(text.contains("รวม 3 รายการ"));
        assert!(text.ends_with("🗑️ ล้างตะกร้า: พิมพ์ '/clear_cart'"));
    }

    #[test]
    fn test_empty_cart_summary() {
        assert_eq!(cart_summary(&[]), CART_EMPTY);
        assert_eq!(checkout(false), CHECKOUT_EMPTY);
        assert_eq!(checkout(true), CHECKOUT_STEPS);
    }

    #[test]
    fn test_suggestions_take_two() {
        let text = suggestions(&[Intent::ScentFresh, Intent::SeasonSummer, Intent::OccasionWork])
            .expect("suggestions");
        assert_eq!(
            text,
            format!(
                "คุณหมายถึง: {}, {} ใช่ไหมคะ?",
                intent_reply(Intent::ScentFresh),
                intent_reply(Intent::SeasonSummer)
            )
        );
        assert!(suggestions(&[]).is_none());
    }

    #[test]
    fn test_carousel_summary() {
        assert_eq!(
            carousel_summary("intro", 3),
            "intro (ส่ง Flex Message แสดง 3 รายการ)"
        );
    }
}
