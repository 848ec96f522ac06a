//! Document hand-off for the external similarity index.
//!
//! The index itself lives outside this crate; we only build one document
//! per product and push it through the `DocumentIndexer` seam. The
//! hand-off is fire-and-forget: an indexing failure is logged and never
//! affects persistence or the returned report.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::document::ProductDocument;
use crate::domain::product::ProductRecord;
use crate::domain::services::DocumentIndexer;

/// Build one document per product record.
pub fn build_documents(products: &[ProductRecord]) -> Vec<ProductDocument> {
    products.iter().map(ProductDocument::from_record).collect()
}

/// Indexer used when no similarity backend is wired in.
pub struct NoopIndexer;

#[async_trait]
impl DocumentIndexer for NoopIndexer {
    async fn index(&self, docs: Vec<ProductDocument>) -> anyhow::Result<()> {
        debug!("Similarity index disabled, dropping {} documents", docs.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::Platform;
    use chrono::Utc;

    #[test]
    fn documents_carry_the_metadata_subset() {
        let record = ProductRecord {
            id: ProductRecord::generate_id(Platform::Cellphones),
            name: "iPhone 14 Pro".into(),
            price: 25_990_000,
            original_price: 25_990_000,
            discount: crate::domain::product::NO_DISCOUNT.into(),
            seller: "CellphoneS".into(),
            rating: 4.8,
            review_count: 12,
            sold_count: None,
            url: "https://cellphones.com.vn/iphone-14-pro.html".into(),
            image: None,
            timestamp: Utc::now(),
            platform: Platform::Cellphones,
        };

        let docs = build_documents(std::slice::from_ref(&record));
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata.name, "iPhone 14 Pro");
        assert_eq!(docs[0].metadata.review_count, 12);
        // Page content embeds the whole record.
        assert!(docs[0].page_content.contains("cellphones.com.vn"));
    }
}
