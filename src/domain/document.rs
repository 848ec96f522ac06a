//! Document shape handed to the external similarity index.

use serde::{Deserialize, Serialize};

use crate::domain::product::ProductRecord;

/// One indexable document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDocument {
    /// Full serialized record, embedded as-is.
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
    pub price: i64,
    pub url: String,
    pub rating: f64,
    pub review_count: i64,
    pub timestamp: String,
}

impl ProductDocument {
    pub fn from_record(product: &ProductRecord) -> Self {
        Self {
            page_content: serde_json::to_string(product).unwrap_or_default(),
            metadata: DocumentMetadata {
                name: product.name.clone(),
                price: product.price,
                url: product.url.clone(),
                rating: product.rating,
                review_count: product.review_count,
                timestamp: product.timestamp.to_rfc3339(),
            },
        }
    }
}
