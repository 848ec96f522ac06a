//! Lazada extractor: static HTML catalog pages.
//!
//! The obfuscated class names (`_17mcb`, `Bm3ON`, ...) come straight
//! from the shipped listing markup and change when Lazada redeploys;
//! selector churn is an accepted operational cost here.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::product::{Platform, RawProduct};
use crate::domain::services::{SiteExtractor, SourceError};
use crate::infrastructure::http_client::HttpClient;

const DOMAIN: &str = "https://www.lazada.vn";
const DEFAULT_LIMIT: usize = 5;
const MAX_PAGES: u32 = 2;

const NAME_SELECTOR: &str = "._17mcb .Bm3ON .buTCk .RfADt a";
const PRICE_SELECTOR: &str = "._17mcb .Bm3ON .buTCk .aBrP0 .ooOxS";
const SOLD_BLOCK_SELECTOR: &str = "._17mcb .Bm3ON .buTCk ._6uN7R";
const SOLD_VALUE_SELECTOR: &str = "._1cEkb";
const ORIGIN_SELECTOR: &str = ".oa6ri";
const RATING_SELECTOR: &str = "._17mcb .Bm3ON .buTCk .qzqFw";

pub struct LazadaExtractor {
    client: Arc<HttpClient>,
}

impl LazadaExtractor {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Lazada's catalog URLs only tolerate ASCII alphanumerics; spaces
    /// become dashes, everything else is dropped.
    fn filter_keyword(term: &str) -> String {
        term.split_whitespace()
            .map(|word| word.chars().filter(char::is_ascii_alphanumeric).collect::<String>())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    fn page_url(keyword: &str, page: u32) -> String {
        format!("{DOMAIN}/catalog/?q={keyword}&page={page}")
    }

    fn resolve_link(href: &str) -> String {
        if href.starts_with("//") {
            format!("https:{href}")
        } else if href.starts_with('/') {
            format!("{DOMAIN}{href}")
        } else {
            href.to_string()
        }
    }

    fn selector(raw: &str) -> Result<Selector, SourceError> {
        Selector::parse(raw).map_err(|e| SourceError::Parse {
            platform: Platform::Lazada,
            message: format!("invalid selector {raw}: {e}"),
        })
    }

    /// Parse one catalog page. The listing is column-oriented (separate
    /// node lists for names, prices, sold blocks, ratings) aligned by
    /// item index; a missing column entry degrades that one field only.
    pub fn parse_listing(html: &str) -> Result<Vec<RawProduct>, SourceError> {
        let document = Html::parse_document(html);

        let name_sel = Self::selector(NAME_SELECTOR)?;
        let price_sel = Self::selector(PRICE_SELECTOR)?;
        let sold_block_sel = Self::selector(SOLD_BLOCK_SELECTOR)?;
        let sold_value_sel = Self::selector(SOLD_VALUE_SELECTOR)?;
        let origin_sel = Self::selector(ORIGIN_SELECTOR)?;
        let rating_sel = Self::selector(RATING_SELECTOR)?;

        let names: Vec<_> = document.select(&name_sel).collect();
        let prices: Vec<String> = document
            .select(&price_sel)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect();
        let sold_blocks: Vec<_> = document.select(&sold_block_sel).collect();
        let ratings: Vec<String> = document
            .select(&rating_sel)
            .map(|el| el.text().collect::<String>())
            .collect();

        let mut products = Vec::new();
        for (index, anchor) in names.iter().enumerate() {
            let name = anchor
                .value()
                .attr("title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| anchor.text().collect::<String>().trim().to_string());
            if name.is_empty() {
                continue;
            }

            let url = match anchor.value().attr("href").map(str::trim).filter(|h| !h.is_empty())
            {
                Some(href) => Self::resolve_link(href),
                None => continue,
            };

            let sold_text = sold_blocks.get(index).and_then(|block| {
                block
                    .select(&sold_value_sel)
                    .next()
                    .map(|el| el.text().collect::<String>().trim().to_string())
            });
            let seller = sold_blocks.get(index).and_then(|block| {
                block
                    .select(&origin_sel)
                    .next()
                    .map(|el| el.text().collect::<String>().trim().to_string())
            });

            products.push(RawProduct {
                name,
                url,
                price_text: prices.get(index).cloned(),
                sold_text: sold_text.filter(|s| !s.is_empty()),
                seller: seller.filter(|s| !s.is_empty()),
                item_text: ratings.get(index).cloned(),
                ..Default::default()
            });
        }

        Ok(products)
    }
}

#[async_trait]
impl SiteExtractor for LazadaExtractor {
    fn platform(&self) -> Platform {
        Platform::Lazada
    }

    async fn extract(
        &self,
        term: &str,
        limit: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<Vec<RawProduct>, SourceError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let keyword = Self::filter_keyword(term);

        let mut products = Vec::new();
        for page in 1..=MAX_PAGES {
            if cancel.is_cancelled() {
                return Err(SourceError::Cancelled { platform: Platform::Lazada });
            }

            let url = Self::page_url(&keyword, page);
            debug!("Fetching Lazada page {}: {}", page, url);

            let html = self
                .client
                .get_text_with_cancellation(&url, &cancel)
                .await
                .map_err(|e| SourceError::Unreachable {
                    platform: Platform::Lazada,
                    message: e.to_string(),
                })?;

            for product in Self::parse_listing(&html)? {
                if products.len() >= limit {
                    break;
                }
                products.push(product);
            }
            if products.len() >= limit {
                break;
            }
        }

        info!("Lazada returned {} products for '{}'", products.len(), term);
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <div class="_17mcb">
          <div class="Bm3ON">
            <div class="buTCk">
              <div class="RfADt">
                <a href="//www.lazada.vn/products/iphone-14-pro-i123.html"
                   title="Apple iPhone 14 Pro 128GB">Apple iPhone 14 Pro 128GB</a>
              </div>
              <div class="aBrP0"><span class="ooOxS">25.990.000 ₫</span></div>
              <div class="_6uN7R">
                <span class="_1cEkb">1.2k đã bán</span>
                <span class="oa6ri">Hà Nội</span>
              </div>
              <div class="qzqFw">4.8 sao (412 đánh giá)</div>
            </div>
          </div>
          <div class="Bm3ON">
            <div class="buTCk">
              <div class="RfADt">
                <a href="/products/op-lung-i456.html" title="Ốp lưng iPhone 14"></a>
              </div>
              <div class="aBrP0"><span class="ooOxS">99.000 ₫</span></div>
            </div>
          </div>
        </div>
    "#;

    #[test]
    fn parses_column_aligned_listing() {
        let products = LazadaExtractor::parse_listing(LISTING).unwrap();
        assert_eq!(products.len(), 2);

        let first = &products[0];
        assert_eq!(first.name, "Apple iPhone 14 Pro 128GB");
        assert_eq!(first.url, "https://www.lazada.vn/products/iphone-14-pro-i123.html");
        assert_eq!(first.price_text.as_deref(), Some("25.990.000 ₫"));
        assert_eq!(first.sold_text.as_deref(), Some("1.2k đã bán"));
        assert_eq!(first.seller.as_deref(), Some("Hà Nội"));
        assert!(first.item_text.as_deref().unwrap().contains("4.8 sao"));

        // Second item has no sold/rating columns: fields degrade, item kept.
        let second = &products[1];
        assert_eq!(second.name, "Ốp lưng iPhone 14");
        assert_eq!(second.url, "https://www.lazada.vn/products/op-lung-i456.html");
        assert!(second.sold_text.is_none());
        assert!(second.seller.is_none());
    }

    #[test]
    fn keyword_filter_keeps_ascii_alphanumerics_only() {
        assert_eq!(LazadaExtractor::filter_keyword("iPhone 14 Pro"), "iPhone-14-Pro");
        assert_eq!(LazadaExtractor::filter_keyword("điện thoại"), "in-thoi");
        assert_eq!(LazadaExtractor::filter_keyword("  tai   nghe! "), "tai-nghe");
    }

    #[test]
    fn empty_page_parses_to_no_products() {
        assert!(LazadaExtractor::parse_listing("<html><body></body></html>")
            .unwrap()
            .is_empty());
    }
}
