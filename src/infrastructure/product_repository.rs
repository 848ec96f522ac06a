//! Repository for the products table.
//!
//! All writes are "insert if absent by url": a duplicate url is a no-op,
//! not an error, which is how cross-search deduplication happens over
//! time. Records are never updated in place (first write wins) and never
//! deleted here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use crate::domain::product::{Platform, ProductRecord};

#[derive(Clone)]
pub struct ProductRepository {
    pool: Arc<SqlitePool>,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Insert one record unless its url already exists. Returns whether a
    /// row was actually written.
    pub async fn insert_if_absent(&self, product: &ProductRecord) -> Result<bool, sqlx::Error> {
        let metadata = serde_json::to_string(product).unwrap_or_default();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO products
            (id, name, price, original_price, discount, seller, rating, review_count,
             sold_count, url, image, platform, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.discount)
        .bind(&product.seller)
        .bind(product.rating)
        .bind(product.review_count)
        .bind(&product.sold_count)
        .bind(&product.url)
        .bind(&product.image)
        .bind(product.platform.as_str())
        .bind(metadata)
        .bind(product.timestamp)
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist a whole batch inside one transaction, committing once.
    ///
    /// A failed insert of a single record (a transient busy condition,
    /// for example) is logged and skipped; it aborts neither the batch
    /// nor the caller. There is deliberately no retry: the next search
    /// that sees the same url recovers it.
    pub async fn save_products(&self, products: &[ProductRecord]) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for product in products {
            let metadata = serde_json::to_string(product).unwrap_or_default();
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO products
                (id, name, price, original_price, discount, seller, rating, review_count,
                 sold_count, url, image, platform, metadata, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&product.id)
            .bind(&product.name)
            .bind(product.price)
            .bind(product.original_price)
            .bind(&product.discount)
            .bind(&product.seller)
            .bind(product.rating)
            .bind(product.review_count)
            .bind(&product.sold_count)
            .bind(&product.url)
            .bind(&product.image)
            .bind(product.platform.as_str())
            .bind(metadata)
            .bind(product.timestamp)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(done) if done.rows_affected() > 0 => {
                    inserted += 1;
                    debug!("Inserted product '{}' url={}", product.name, product.url);
                }
                Ok(_) => {
                    debug!("Product already stored, skipping url={}", product.url);
                }
                Err(e) => {
                    warn!("Skipping product '{}' after write error: {}", product.name, e);
                }
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<ProductRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price, original_price, discount, seller, rating, review_count,
                   sold_count, url, image, platform, created_at
            FROM products WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(|row| Self::record_from_row(&row)))
    }

    pub async fn count_products(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM products")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("total"))
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> ProductRecord {
        let platform: String = row.get("platform");
        let created_at: DateTime<Utc> = row.get("created_at");
        ProductRecord {
            id: row.get("id"),
            name: row.get("name"),
            price: row.get("price"),
            original_price: row.get("original_price"),
            discount: row.get("discount"),
            seller: row.get("seller"),
            rating: row.get("rating"),
            review_count: row.get("review_count"),
            sold_count: row.get("sold_count"),
            url: row.get("url"),
            image: row.get("image"),
            platform: Platform::parse(&platform).unwrap_or(Platform::Tiki),
            timestamp: created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database_connection::DatabaseConnection;
    use chrono::Utc;
    use tempfile::tempdir;

    fn sample(url: &str) -> ProductRecord {
        ProductRecord {
            id: ProductRecord::generate_id(Platform::Tiki),
            name: "iPhone 14 Pro 128GB".into(),
            price: 25_990_000,
            original_price: 28_990_000,
            discount: "-10%".into(),
            seller: "Apple Flagship Store".into(),
            rating: 4.9,
            review_count: 321,
            sold_count: Some("1.2k".into()),
            url: url.into(),
            image: None,
            timestamp: Utc::now(),
            platform: Platform::Tiki,
        }
    }

    async fn test_repository() -> (ProductRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("repo.db").display());
        let db = DatabaseConnection::new(&url).await.unwrap();
        db.migrate().await.unwrap();
        (ProductRepository::new(db.pool().clone()), dir)
    }

    #[tokio::test]
    async fn duplicate_url_is_a_no_op() {
        let (repo, _dir) = test_repository().await;

        let first = sample("https://tiki.vn/iphone-14-pro");
        assert!(repo.insert_if_absent(&first).await.unwrap());

        // Same url, different id and price: first write wins.
        let mut second = sample("https://tiki.vn/iphone-14-pro");
        second.price = 1;
        assert!(!repo.insert_if_absent(&second).await.unwrap());

        assert_eq!(repo.count_products().await.unwrap(), 1);
        let stored = repo.find_by_url("https://tiki.vn/iphone-14-pro").await.unwrap().unwrap();
        assert_eq!(stored.price, 25_990_000);
    }

    #[tokio::test]
    async fn batch_save_reports_inserted_rows_only() {
        let (repo, _dir) = test_repository().await;

        let batch = vec![
            sample("https://tiki.vn/a"),
            sample("https://tiki.vn/b"),
            sample("https://tiki.vn/a"), // in-batch duplicate
        ];
        assert_eq!(repo.save_products(&batch).await.unwrap(), 2);

        // Persisting the same batch again inserts nothing.
        assert_eq!(repo.save_products(&batch).await.unwrap(), 0);
        assert_eq!(repo.count_products().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn round_trips_record_fields() {
        let (repo, _dir) = test_repository().await;
        let record = sample("https://tiki.vn/round-trip");
        repo.insert_if_absent(&record).await.unwrap();

        let stored = repo.find_by_url(&record.url).await.unwrap().unwrap();
        assert_eq!(stored.name, record.name);
        assert_eq!(stored.seller, record.seller);
        assert_eq!(stored.sold_count, record.sold_count);
        assert_eq!(stored.platform, Platform::Tiki);
    }
}
