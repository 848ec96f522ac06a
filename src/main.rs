//! CLI entry point: run one acquisition for a search term given on the
//! command line and print the consolidation summary.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use sophie_crawler::application::{format_summary, save_report, AcquisitionService};
use sophie_crawler::domain::services::ProductSink;
use sophie_crawler::infrastructure::config::AppConfig;
use sophie_crawler::infrastructure::database_connection::DatabaseConnection;
use sophie_crawler::infrastructure::db_writer::{DirectSink, QueuedSink};
use sophie_crawler::infrastructure::extractors::default_registry;
use sophie_crawler::infrastructure::http_client::HttpClient;
use sophie_crawler::infrastructure::logging::init_logging;
use sophie_crawler::infrastructure::product_repository::ProductRepository;
use sophie_crawler::infrastructure::vector_index::NoopIndexer;

#[tokio::main]
async fn main() -> Result<()> {
    let term = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let term = term.trim().to_string();
    if term.is_empty() {
        eprintln!("Usage: sophie-crawler <search term>");
        eprintln!("Example: sophie-crawler iPhone 14 Pro");
        std::process::exit(2);
    }

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging)?;
    info!("Sophie starting, search term: '{}'", term);

    let db = DatabaseConnection::new(&config.database.url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    db.migrate().await.context("Failed to run database migration")?;
    let repository = ProductRepository::new(db.pool().clone());

    let mut queued: Option<Arc<QueuedSink>> = None;
    let sink: Arc<dyn ProductSink> = if config.acquisition.use_background_writer {
        let writer = Arc::new(QueuedSink::new(repository.clone()));
        queued = Some(Arc::clone(&writer));
        writer
    } else {
        Arc::new(DirectSink::new(repository.clone()))
    };

    let client = Arc::new(HttpClient::new(config.http.clone())?);
    let service = AcquisitionService::new(
        default_registry(client),
        sink,
        Arc::new(NoopIndexer),
        config.acquisition.clone(),
    );

    let report = service.acquire_products(&term, None).await;
    println!("{}", format_summary(&report));

    if config.reports.save_json {
        if let Err(err) = save_report(&report, Path::new(&config.reports.directory)).await {
            error!("Failed to save report: {:#}", err);
        }
    }

    if let Some(writer) = queued {
        writer.shutdown().await;
    }

    info!("Done: {} products persisted or already known", report.total_products);
    Ok(())
}
