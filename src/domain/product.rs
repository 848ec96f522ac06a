use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display sentinel used when a product carries no strikethrough price.
pub const NO_DISCOUNT: &str = "Không giảm giá";

/// One external product catalog or search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Tiki,
    Lazada,
    Cellphones,
    DienThoaiVui,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiki => "tiki",
            Self::Lazada => "lazada",
            Self::Cellphones => "cellphones",
            Self::DienThoaiVui => "dienthoaivui",
        }
    }

    /// Seller label used when the source exposes no seller information.
    pub fn fallback_seller(&self) -> &'static str {
        match self {
            Self::Tiki | Self::Lazada => "Unknown Seller",
            Self::Cellphones => "CellphoneS",
            Self::DienThoaiVui => "Điện Thoại Vui",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tiki" => Some(Self::Tiki),
            "lazada" => Some(Self::Lazada),
            "cellphones" => Some(Self::Cellphones),
            "dienthoaivui" => Some(Self::DienThoaiVui),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-native extracted data for one product, before normalization.
///
/// Structured sources (the Tiki API) fill the typed fields directly;
/// listing scrapers usually only have display text and rely on the
/// normalizer's heuristics over `price_text` / `item_text`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProduct {
    pub name: String,
    pub url: String,
    pub price_text: Option<String>,
    pub price_value: Option<i64>,
    pub original_price: Option<i64>,
    pub discount_rate: Option<i64>,
    pub seller: Option<String>,
    pub rating_value: Option<f64>,
    pub review_count: Option<i64>,
    pub sold_text: Option<String>,
    /// Whole listing-item text, used for rating/review/sold heuristics.
    pub item_text: Option<String>,
    pub image: Option<String>,
}

/// Canonical product shape shared by every platform.
///
/// Immutable after normalization; the persisted store keys uniquely on
/// `url` and ignores later writes for the same url (first write wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Generated at normalization time, never taken from the source.
    pub id: String,
    pub name: String,
    pub price: i64,
    pub original_price: i64,
    pub discount: String,
    pub seller: String,
    pub rating: f64,
    pub review_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sold_count: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub platform: Platform,
}

impl ProductRecord {
    /// Fresh record identifier: `{platform}_{uuid-v4}`.
    pub fn generate_id(platform: Platform) -> String {
        format!("{}_{}", platform.as_str(), uuid::Uuid::new_v4())
    }
}
