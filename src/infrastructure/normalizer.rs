//! Normalization of source-native records into the canonical schema.
//!
//! The Vietnamese retail sites are wildly inconsistent about prices
//! (`1.090.000đ`, `1,090,000 VND`, `1090000`), ratings ("4.5 sao",
//! "4.5/5 sao", "4.5 ★") and sold counts ("1.2k đã bán", "Bán: 500+").
//! Parsing here is heuristic: ordered pattern alternatives, most specific
//! first, first acceptable match wins, and a failed parse degrades to the
//! field default instead of rejecting the record.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::domain::product::{Platform, ProductRecord, RawProduct, NO_DISCOUNT};

// First numeric run that is either thousands-grouped or at least four
// digits. Short bare numbers ("5", "128") are item counts or storage
// sizes far more often than prices.
static PRICE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:[.,]\d{3})+(?:[.,]\d+)?|\d{4,}").unwrap());

static RATING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\d+(?:\.\d+)?)\s*/\s*5\s*sao",
        r"(?i)(\d+(?:\.\d+)?)\s*sao",
        r"(?i)Rating:\s*(\d+(?:\.\d+)?)",
        r"(\d+(?:\.\d+)?)\s*★",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static REVIEW_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\d+)\s*(?:đánh giá|review|nhận xét)",
        r"(?i)\((\d+)\s*(?:đánh giá|review)\)",
        r"(?i)(\d+)\s*comment",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SOLD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\d+[k\d,.]*)\s*(?:đã bán|sold)",
        r"(?i)Bán:\s*(\d+[k\d,.]*)",
        r"(?i)(\d+[k\d,.]*)\s*lượt mua",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Parse a display price into VND. Returns 0 when no usable numeric run
/// is present; a zero price never fails the whole record.
pub fn parse_price(text: &str) -> i64 {
    let stripped = text
        .replace('₫', " ")
        .replace('đ', " ")
        .replace("VND", " ")
        .replace("vnđ", " ");

    let Some(run) = PRICE_RUN.find(&stripped) else {
        return 0;
    };

    let digits: String = run.as_str().chars().filter(char::is_ascii_digit).collect();
    digits.parse::<i64>().unwrap_or(0)
}

/// Extract a star rating from free text. Out-of-range candidates
/// (e.g. "12.5 sao") are discarded, never clamped; the next pattern gets
/// a chance before falling back to the unknown default 0.0.
pub fn parse_rating(text: &str) -> f64 {
    for pattern in RATING_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(value) = caps[1].parse::<f64>() {
                if (0.0..=5.0).contains(&value) {
                    return value;
                }
                trace!("Discarding out-of-range rating {} in {:?}", value, &caps[0]);
            }
        }
    }
    0.0
}

/// Extract a review count from free text; 0 when unknown.
pub fn parse_review_count(text: &str) -> i64 {
    for pattern in REVIEW_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(value) = caps[1].parse::<i64>() {
                return value.max(0);
            }
        }
    }
    0
}

/// Extract a sold-count display string ("1.2k", "500+") from free text.
/// Sources report this so inconsistently that it stays free text.
pub fn parse_sold_count(text: &str) -> Option<String> {
    for pattern in SOLD_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].to_string());
        }
    }
    None
}

fn discount_label(price: i64, original_price: i64, discount_rate: Option<i64>) -> String {
    if let Some(rate) = discount_rate {
        if rate > 0 {
            return format!("-{rate}%");
        }
    }
    if original_price > price && original_price > 0 {
        let rate = (original_price - price) * 100 / original_price;
        if rate > 0 {
            return format!("-{rate}%");
        }
    }
    NO_DISCOUNT.to_string()
}

/// Map one raw record into the canonical schema.
///
/// Returns `None` when the record has no usable name; such records are
/// silently dropped, they are not source errors. Every produced record
/// gets a fresh id and timestamp regardless of what the source supplied.
pub fn normalize(raw: RawProduct, platform: Platform) -> Option<ProductRecord> {
    let name = raw.name.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let price = raw
        .price_value
        .or_else(|| raw.price_text.as_deref().map(parse_price))
        .unwrap_or(0);
    let original_price = raw.original_price.filter(|&p| p > 0).unwrap_or(price);

    let item_text = raw.item_text.as_deref().unwrap_or("");

    // Structured ratings still go through the bound check; a bad feed
    // must not overflow the 5-star scale either.
    let rating = match raw.rating_value {
        Some(value) if (0.0..=5.0).contains(&value) => value,
        Some(_) => 0.0,
        None => parse_rating(item_text),
    };

    let review_count = raw
        .review_count
        .map(|c| c.max(0))
        .unwrap_or_else(|| parse_review_count(item_text));

    let sold_count = raw
        .sold_text
        .filter(|s| !s.trim().is_empty())
        .or_else(|| parse_sold_count(item_text));

    let seller = raw
        .seller
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| platform.fallback_seller().to_string());

    Some(ProductRecord {
        id: ProductRecord::generate_id(platform),
        name,
        price,
        original_price,
        discount: discount_label(price, original_price, raw.discount_rate),
        seller,
        rating,
        review_count,
        sold_count,
        url: raw.url,
        image: raw.image,
        timestamp: Utc::now(),
        platform,
    })
}
