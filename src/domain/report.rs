//! Consolidated outcome of one multi-source acquisition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::{Platform, ProductRecord};

/// Per-source breakdown entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub platform: Platform,
    pub count: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn succeeded(platform: Platform, count: usize, duration_ms: u64) -> Self {
        Self { platform, count, duration_ms, error: None }
    }

    pub fn failed(platform: Platform, duration_ms: u64, error: impl Into<String>) -> Self {
        Self { platform, count: 0, duration_ms, error: Some(error.into()) }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregated result of fanning one search term out to every source.
///
/// An empty product list is a valid outcome, not an error; the chat layer
/// decides how to phrase "not found".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationReport {
    pub search_term: String,
    pub generated_at: DateTime<Utc>,
    pub total_products: usize,
    pub duration_ms: u64,
    pub sources: Vec<SourceOutcome>,
    pub products: Vec<ProductRecord>,
}

impl ConsolidationReport {
    /// Sources that completed without an error annotation.
    pub fn successful_sources(&self) -> usize {
        self.sources.iter().filter(|s| !s.is_error()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_with_source_breakdown() {
        let report = ConsolidationReport {
            search_term: "iPhone 14".into(),
            generated_at: Utc::now(),
            total_products: 0,
            duration_ms: 12,
            sources: vec![
                SourceOutcome::succeeded(Platform::Tiki, 0, 5),
                SourceOutcome::failed(Platform::Lazada, 7, "timed out after 45s"),
            ],
            products: Vec::new(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sources"][0]["platform"], "tiki");
        assert!(json["sources"][0].get("error").is_none());
        assert_eq!(json["sources"][1]["error"], "timed out after 45s");
        assert_eq!(report.successful_sources(), 1);
    }
}
