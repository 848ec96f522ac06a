//! Per-site extractors.
//!
//! Each extractor owns one acquisition strategy: Tiki uses the search
//! API, Lazada scrapes static catalog HTML, CellphoneS and Điện Thoại
//! Vui render their listings in headless Chromium first.

pub mod cellphones;
pub mod dienthoaivui;
pub mod lazada;
pub mod tiki;

use std::sync::Arc;

use scraper::ElementRef;

use crate::domain::services::SiteExtractor;
use crate::infrastructure::http_client::HttpClient;

pub use cellphones::CellphonesExtractor;
pub use dienthoaivui::DienThoaiVuiExtractor;
pub use lazada::LazadaExtractor;
pub use tiki::TikiExtractor;

/// All four extractors, sharing one HTTP client.
pub fn default_registry(client: Arc<HttpClient>) -> Vec<Arc<dyn SiteExtractor>> {
    vec![
        Arc::new(TikiExtractor::new(Arc::clone(&client))),
        Arc::new(LazadaExtractor::new(client)),
        Arc::new(CellphonesExtractor::new()),
        Arc::new(DienThoaiVuiExtractor::new()),
    ]
}

/// Text content of an element, one line per text node.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join("\n")
}

/// First non-empty trimmed line. Listing anchors tend to stack the
/// title over promo lines; the title comes first.
pub(crate) fn first_non_empty_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::first_non_empty_line;

    #[test]
    fn first_non_empty_line_skips_whitespace_lines() {
        assert_eq!(first_non_empty_line("\n   \n  iPhone 14\n Giảm sốc"), "iPhone 14");
        assert_eq!(first_non_empty_line("   "), "");
    }
}
