//! Domain layer: canonical product shapes, service traits and the
//! consolidation report returned to callers.

pub mod document;
pub mod product;
pub mod report;
pub mod services;

pub use document::{DocumentMetadata, ProductDocument};
pub use product::{Platform, ProductRecord, RawProduct, NO_DISCOUNT};
pub use report::{ConsolidationReport, SourceOutcome};
pub use services::{DocumentIndexer, ProductSink, SinkError, SiteExtractor, SourceError};
