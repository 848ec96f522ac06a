//! Sophie: multi-platform product acquisition and price consolidation
//! for Vietnamese e-commerce sites (Tiki, Lazada, CellphoneS, Điện
//! Thoại Vui).
//!
//! One search term is fanned out to every registered site extractor in
//! a bounded worker pool, raw listings are normalized into canonical
//! product records, persisted idempotently to SQLite, and consolidated
//! into a single per-source report.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::AcquisitionService;
pub use domain::product::{Platform, ProductRecord, RawProduct};
pub use domain::report::{ConsolidationReport, SourceOutcome};
pub use domain::services::{DocumentIndexer, ProductSink, SiteExtractor, SinkError, SourceError};
pub use infrastructure::config::AppConfig;
