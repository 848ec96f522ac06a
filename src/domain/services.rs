//! Service layer traits for the acquisition pipeline.
//!
//! These are the seams between the fan-out coordinator and its
//! collaborators: site extractors, the persistence sink and the
//! (external) similarity-index side channel.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::document::ProductDocument;
use crate::domain::product::{Platform, ProductRecord, RawProduct};

/// Failure of a single source. Always absorbed by the coordinator and
/// surfaced as an annotation on that source's outcome, never propagated
/// to the caller.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("{platform}: unreachable: {message}")]
    Unreachable { platform: Platform, message: String },

    #[error("{platform}: parse failure: {message}")]
    Parse { platform: Platform, message: String },

    #[error("{platform}: browser rendering failed: {message}")]
    Browser { platform: Platform, message: String },

    #[error("{platform}: timed out after {seconds}s")]
    Timeout { platform: Platform, seconds: u64 },

    #[error("{platform}: cancelled")]
    Cancelled { platform: Platform },
}

impl SourceError {
    pub fn platform(&self) -> Platform {
        match self {
            Self::Unreachable { platform, .. }
            | Self::Parse { platform, .. }
            | Self::Browser { platform, .. }
            | Self::Timeout { platform, .. }
            | Self::Cancelled { platform } => *platform,
        }
    }
}

/// Persistence failure. `Unavailable` is fatal for the sink; everything
/// record-scoped is handled inside the sink and never raised here.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("writer queue closed")]
    QueueClosed,
}

/// One site-specific extractor. The coordinator treats every variant
/// (API call, static HTML, browser rendering) as this one capability.
#[async_trait]
pub trait SiteExtractor: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetch raw product records for a search term.
    ///
    /// `limit` is an advisory soft cap; extractors may return more and the
    /// coordinator will not re-enforce it. Missing fields on individual
    /// items never abort the rest; only total inability to reach or parse
    /// the source is an error. Implementations must observe `cancel` at
    /// their suspension points and release any acquired resources
    /// (browser handles in particular) on every exit path.
    async fn extract(
        &self,
        term: &str,
        limit: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<Vec<RawProduct>, SourceError>;
}

/// Durable persistence of normalized records, idempotent by `url`.
///
/// Two implementations exist behind this contract: the queued
/// single-writer sink and the synchronous direct sink. Call sites never
/// know which is active.
#[async_trait]
pub trait ProductSink: Send + Sync {
    /// Persist a batch. Returns the number of records accepted for
    /// writing (for the direct sink this equals the rows inserted;
    /// the queued sink reports the batch size it enqueued).
    async fn persist(&self, products: Vec<ProductRecord>) -> Result<u64, SinkError>;
}

/// Fire-and-forget hand-off to the external similarity index. Failures
/// here must never affect persistence or the returned report.
#[async_trait]
pub trait DocumentIndexer: Send + Sync {
    async fn index(&self, docs: Vec<ProductDocument>) -> anyhow::Result<()>;
}
