//! Fan-out coordinator: one search term, every registered source.
//!
//! Each source runs as its own tokio task inside a bounded worker pool.
//! The coordinator owns the per-source deadline; an extractor that
//! overruns it is cancelled and reported as that source's failure while
//! its siblings keep running. Failures never cross source boundaries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::product::{Platform, ProductRecord};
use crate::domain::report::{ConsolidationReport, SourceOutcome};
use crate::domain::services::{DocumentIndexer, ProductSink, SiteExtractor, SourceError};
use crate::infrastructure::config::AcquisitionConfig;
use crate::infrastructure::normalizer;
use crate::infrastructure::vector_index::build_documents;

pub struct AcquisitionService {
    extractors: Vec<Arc<dyn SiteExtractor>>,
    sink: Arc<dyn ProductSink>,
    indexer: Arc<dyn DocumentIndexer>,
    config: AcquisitionConfig,
}

struct SourceResult {
    platform: Platform,
    duration_ms: u64,
    records: Result<Vec<ProductRecord>, SourceError>,
}

impl AcquisitionService {
    pub fn new(
        extractors: Vec<Arc<dyn SiteExtractor>>,
        sink: Arc<dyn ProductSink>,
        indexer: Arc<dyn DocumentIndexer>,
        config: AcquisitionConfig,
    ) -> Self {
        Self { extractors, sink, indexer, config }
    }

    /// Run one acquisition across all registered sources and return the
    /// consolidated report.
    ///
    /// `limit` truncates the merged product list only; per-source caps
    /// are the extractors' own policy. The report is returned even when
    /// every source failed or persistence was unavailable.
    pub async fn acquire_products(
        &self,
        term: &str,
        limit: Option<usize>,
    ) -> ConsolidationReport {
        let started = Instant::now();
        let generated_at = Utc::now();
        let deadline = Duration::from_secs(self.config.source_timeout_secs);
        let per_source = Some(self.config.per_source_limit);
        let pool = Arc::new(Semaphore::new(self.config.max_concurrent_sources.max(1)));

        info!("Acquiring products for '{}' from {} sources", term, self.extractors.len());

        let mut tasks: JoinSet<SourceResult> = JoinSet::new();
        let mut task_platforms: HashMap<tokio::task::Id, Platform> = HashMap::new();

        for extractor in &self.extractors {
            let extractor = Arc::clone(extractor);
            let pool = Arc::clone(&pool);
            let term = term.to_string();
            let platform = extractor.platform();

            let handle = tasks.spawn(async move {
                let _permit = pool.acquire_owned().await.ok();
                let source_started = Instant::now();
                let cancel = CancellationToken::new();

                let raw = match tokio::time::timeout(
                    deadline,
                    extractor.extract(&term, per_source, cancel.clone()),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => {
                        cancel.cancel();
                        Err(SourceError::Timeout { platform, seconds: deadline.as_secs() })
                    }
                };

                let records = raw.map(|items| {
                    items
                        .into_iter()
                        .filter_map(|item| normalizer::normalize(item, platform))
                        .collect::<Vec<_>>()
                });

                SourceResult {
                    platform,
                    duration_ms: source_started.elapsed().as_millis() as u64,
                    records,
                }
            });
            task_platforms.insert(handle.id(), platform);
        }

        let mut sources = Vec::with_capacity(self.extractors.len());
        let mut merged: Vec<ProductRecord> = Vec::new();

        // Completion order; the merged list's ordering is not a contract.
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, result)) => match result.records {
                    Ok(records) => {
                        info!(
                            "{} finished with {} products in {}ms",
                            result.platform,
                            records.len(),
                            result.duration_ms
                        );
                        sources.push(SourceOutcome::succeeded(
                            result.platform,
                            records.len(),
                            result.duration_ms,
                        ));
                        merged.extend(records);
                    }
                    Err(err) => {
                        warn!("{} failed: {}", result.platform, err);
                        sources.push(SourceOutcome::failed(
                            result.platform,
                            result.duration_ms,
                            err.to_string(),
                        ));
                    }
                },
                Err(join_error) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    match task_platforms.get(&join_error.id()).copied() {
                        Some(platform) => {
                            error!("{} task aborted: {}", platform, join_error);
                            sources.push(SourceOutcome::failed(
                                platform,
                                duration_ms,
                                format!("task aborted: {join_error}"),
                            ));
                        }
                        None => error!("unattributable source task failure: {}", join_error),
                    }
                }
            }
        }

        if merged.is_empty() {
            debug!("No products acquired for '{}'", term);
        } else {
            match self.sink.persist(merged.clone()).await {
                Ok(accepted) => {
                    info!("Sink accepted {} of {} products", accepted, merged.len())
                }
                Err(err) => error!("Failed to persist {} products: {}", merged.len(), err),
            }

            let docs = build_documents(&merged);
            let indexer = Arc::clone(&self.indexer);
            tokio::spawn(async move {
                if let Err(err) = indexer.index(docs).await {
                    warn!("Document indexing failed: {:#}", err);
                }
            });
        }

        if let Some(limit) = limit {
            merged.truncate(limit);
        }

        ConsolidationReport {
            search_term: term.to_string(),
            generated_at,
            total_products: merged.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            sources,
            products: merged,
        }
    }
}
