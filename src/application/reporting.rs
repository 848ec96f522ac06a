//! Report presentation and export: the console summary and the optional
//! timestamped JSON file.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::report::ConsolidationReport;

/// Render the console summary: per-source breakdown plus the top
/// products with formatted prices.
pub fn format_summary(report: &ConsolidationReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Kết quả cho '{}'", report.search_term);
    let _ = writeln!(
        out,
        "{} sản phẩm từ {}/{} nguồn trong {}ms",
        report.total_products,
        report.successful_sources(),
        report.sources.len(),
        report.duration_ms
    );
    let _ = writeln!(out);

    for source in &report.sources {
        match &source.error {
            None => {
                let _ = writeln!(
                    out,
                    "  ✓ {:<13} {} sản phẩm ({}ms)",
                    source.platform.to_string(),
                    source.count,
                    source.duration_ms
                );
            }
            Some(error) => {
                let _ = writeln!(out, "  ✗ {:<13} {}", source.platform.to_string(), error);
            }
        }
    }

    if !report.products.is_empty() {
        let _ = writeln!(out);
        for (index, product) in report.products.iter().enumerate().take(10) {
            let _ = writeln!(
                out,
                "  {}. [{}] {} — {}",
                index + 1,
                product.platform,
                product.name,
                format_vnd(product.price)
            );
            let _ = writeln!(out, "     {} | {} | {}", product.seller, product.discount, product.url);
        }
    }

    out
}

/// Group digits with `.` separators, Vietnamese style: 15990000 → "15.990.000đ".
pub fn format_vnd(price: i64) -> String {
    let digits = price.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if price < 0 {
        grouped.insert(0, '-');
    }
    grouped.push('đ');
    grouped
}

/// Write the report to `{directory}/report_{slug}_{timestamp}.json` and
/// return the path.
pub async fn save_report(report: &ConsolidationReport, directory: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(directory)
        .await
        .with_context(|| format!("Failed to create report directory {}", directory.display()))?;

    let slug: String = report
        .search_term
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let filename = format!(
        "report_{}_{}.json",
        slug.trim_matches('-'),
        report.generated_at.format("%Y%m%d_%H%M%S")
    );
    let path = directory.join(filename);

    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    info!("Saved report to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::product::Platform;
    use crate::domain::report::SourceOutcome;

    fn sample_report() -> ConsolidationReport {
        ConsolidationReport {
            search_term: "iPhone 14".into(),
            generated_at: Utc::now(),
            total_products: 0,
            duration_ms: 1234,
            sources: vec![
                SourceOutcome::succeeded(Platform::Tiki, 3, 800),
                SourceOutcome::failed(Platform::Lazada, 45000, "lazada: timed out after 45s"),
            ],
            products: Vec::new(),
        }
    }

    #[test]
    fn vnd_formatting_groups_thousands() {
        assert_eq!(format_vnd(0), "0đ");
        assert_eq!(format_vnd(999), "999đ");
        assert_eq!(format_vnd(1_090_000), "1.090.000đ");
        assert_eq!(format_vnd(25_990_000), "25.990.000đ");
    }

    #[test]
    fn summary_marks_failed_sources() {
        let summary = format_summary(&sample_report());
        assert!(summary.contains("✓ tiki"));
        assert!(summary.contains("✗ lazada"));
        assert!(summary.contains("timed out"));
    }

    #[tokio::test]
    async fn report_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();

        let path = save_report(&report, dir.path()).await.unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("report_iphone-14_"));

        let loaded: ConsolidationReport =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(loaded.search_term, "iPhone 14");
        assert_eq!(loaded.sources.len(), 2);
    }
}
