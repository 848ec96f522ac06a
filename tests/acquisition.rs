//! End-to-end coordinator behavior against a real SQLite store: mixed
//! success, timeout and empty sources in one acquisition.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use sophie_crawler::application::AcquisitionService;
use sophie_crawler::domain::product::{Platform, RawProduct};
use sophie_crawler::domain::services::{ProductSink, SiteExtractor, SourceError};
use sophie_crawler::infrastructure::config::AcquisitionConfig;
use sophie_crawler::infrastructure::database_connection::DatabaseConnection;
use sophie_crawler::infrastructure::db_writer::DirectSink;
use sophie_crawler::infrastructure::product_repository::ProductRepository;
use sophie_crawler::infrastructure::vector_index::NoopIndexer;

struct FixedExtractor {
    platform: Platform,
    items: Vec<RawProduct>,
}

#[async_trait]
impl SiteExtractor for FixedExtractor {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn extract(
        &self,
        _term: &str,
        _limit: Option<usize>,
        _cancel: CancellationToken,
    ) -> Result<Vec<RawProduct>, SourceError> {
        Ok(self.items.clone())
    }
}

/// Never returns on its own; relies on the coordinator's deadline.
struct HangingExtractor {
    platform: Platform,
}

#[async_trait]
impl SiteExtractor for HangingExtractor {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn extract(
        &self,
        _term: &str,
        _limit: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<Vec<RawProduct>, SourceError> {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(600)) => Ok(Vec::new()),
            _ = cancel.cancelled() => {
                Err(SourceError::Cancelled { platform: self.platform })
            }
        }
    }
}

fn raw(name: &str, url: &str, price: &str) -> RawProduct {
    RawProduct {
        name: name.to_string(),
        url: url.to_string(),
        price_text: Some(price.to_string()),
        ..Default::default()
    }
}

async fn sqlite_repository(dir: &TempDir) -> ProductRepository {
    let url = format!("sqlite:{}", dir.path().join("acquisition.db").display());
    let db = DatabaseConnection::new(&url).await.unwrap();
    db.migrate().await.unwrap();
    ProductRepository::new(db.pool().clone())
}

#[tokio::test]
async fn mixed_sources_consolidate_into_one_report_and_store() {
    let dir = TempDir::new().unwrap();
    let repository = sqlite_repository(&dir).await;

    // Tiki yields 3, Lazada hangs past the deadline, CellphoneS yields 2
    // of which one shares a URL with a Tiki item, Điện Thoại Vui is empty.
    let shared_url = "https://example.vn/iphone-14-pro";
    let extractors: Vec<Arc<dyn SiteExtractor>> = vec![
        Arc::new(FixedExtractor {
            platform: Platform::Tiki,
            items: vec![
                raw("iPhone 14 Pro", shared_url, "25.990.000đ"),
                raw("iPhone 14", "https://tiki.vn/iphone-14", "20.990.000đ"),
                raw("iPhone 14 Plus", "https://tiki.vn/iphone-14-plus", "22.990.000đ"),
            ],
        }),
        Arc::new(HangingExtractor { platform: Platform::Lazada }),
        Arc::new(FixedExtractor {
            platform: Platform::Cellphones,
            items: vec![
                raw("iPhone 14 Pro", shared_url, "25.490.000đ"),
                raw("iPhone 14 Pro Max", "https://cellphones.com.vn/ip14pm.html", "29.990.000đ"),
            ],
        }),
        Arc::new(FixedExtractor { platform: Platform::DienThoaiVui, items: Vec::new() }),
    ];

    let service = AcquisitionService::new(
        extractors,
        Arc::new(DirectSink::new(repository.clone())),
        Arc::new(NoopIndexer),
        AcquisitionConfig { source_timeout_secs: 1, ..Default::default() },
    );

    let report = service.acquire_products("iphone 14", None).await;

    assert_eq!(report.sources.len(), 4);

    let outcome = |platform: Platform| {
        report.sources.iter().find(|s| s.platform == platform).unwrap()
    };
    assert_eq!(outcome(Platform::Tiki).count, 3);
    assert_eq!(outcome(Platform::Cellphones).count, 2);
    assert_eq!(outcome(Platform::DienThoaiVui).count, 0);
    assert!(!outcome(Platform::DienThoaiVui).is_error());

    let lazada = outcome(Platform::Lazada);
    assert!(lazada.is_error());
    assert_eq!(lazada.count, 0);
    assert!(lazada.error.as_deref().unwrap().contains("timed out"));

    // The merged list keeps the cross-source duplicate.
    assert_eq!(report.total_products, 5);
    assert_eq!(report.products.len(), 5);
    assert_eq!(
        report.products.iter().filter(|p| p.url == shared_url).count(),
        2
    );

    // The store does not: url is the dedup key.
    assert_eq!(repository.count_products().await.unwrap(), 4);
    let kept = repository.find_by_url(shared_url).await.unwrap().unwrap();
    assert_eq!(kept.name, "iPhone 14 Pro");

    // Every record id is platform-prefixed and unique.
    let mut ids: Vec<&str> = report.products.iter().map(|p| p.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
    assert!(report
        .products
        .iter()
        .all(|p| p.id.starts_with(&format!("{}_", p.platform))));
}

#[tokio::test]
async fn repeated_acquisitions_are_idempotent_in_the_store() {
    let dir = TempDir::new().unwrap();
    let repository = sqlite_repository(&dir).await;

    let extractors: Vec<Arc<dyn SiteExtractor>> = vec![Arc::new(FixedExtractor {
        platform: Platform::Tiki,
        items: vec![raw("Galaxy S23", "https://tiki.vn/galaxy-s23", "15.990.000đ")],
    })];

    let service = AcquisitionService::new(
        extractors,
        Arc::new(DirectSink::new(repository.clone())),
        Arc::new(NoopIndexer),
        AcquisitionConfig::default(),
    );

    let first = service.acquire_products("galaxy", None).await;
    let second = service.acquire_products("galaxy", None).await;

    assert_eq!(first.total_products, 1);
    assert_eq!(second.total_products, 1);
    assert_eq!(repository.count_products().await.unwrap(), 1);
}
