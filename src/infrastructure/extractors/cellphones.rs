//! CellphoneS extractor: the search listing is hydrated client-side, so
//! pages are rendered in headless Chromium before parsing.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use crate::domain::product::{Platform, RawProduct};
use crate::domain::services::{SiteExtractor, SourceError};
use crate::infrastructure::browser::{render_page, RenderRequest};
use crate::infrastructure::extractors::{element_text, first_non_empty_line};

const DEFAULT_LIMIT: usize = 5;
const WAIT_SELECTORS: &[&str] =
    &[".product-item", "a.product-item-link", "div.product-item-info", ".product-card"];
const ITEM_SELECTORS: &[&str] =
    &[".product-item", "div.product-item-info", ".product-card", ".product-item-wrap"];
const PRICE_SELECTORS: &[&str] =
    &[".price", ".product-price", ".price-final_price", ".price-box", "[data-price]"];

pub struct CellphonesExtractor;

impl CellphonesExtractor {
    pub fn new() -> Self {
        Self
    }

    fn search_url(term: &str) -> String {
        format!(
            "https://cellphones.com.vn/catalogsearch/result?q={}",
            urlencode(term)
        )
    }

    fn selector(raw: &str) -> Result<Selector, SourceError> {
        Selector::parse(raw).map_err(|e| SourceError::Parse {
            platform: Platform::Cellphones,
            message: format!("invalid selector {raw}: {e}"),
        })
    }

    fn parse_item(item: ElementRef<'_>, base: &Url) -> Option<RawProduct> {
        let anchor_sel = Selector::parse("a.product-item-link").ok()?;
        let any_anchor_sel = Selector::parse("a[href]").ok()?;
        let img_sel = Selector::parse("img").ok()?;

        let anchor = item.select(&anchor_sel).next().or_else(|| item.select(&any_anchor_sel).next())?;
        let href = anchor.value().attr("href")?;
        let url = base.join(href).ok()?.to_string();

        let name = {
            let text = element_text(&anchor);
            let line = first_non_empty_line(&text);
            if line.is_empty() {
                item.value().attr("data-name").unwrap_or_default().trim().to_string()
            } else {
                line
            }
        };

        let image = item
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| base.join(src).ok())
            .map(|u| u.to_string());

        let mut price_text = None;
        for selector in PRICE_SELECTORS {
            let Ok(sel) = Selector::parse(selector) else { continue };
            if let Some(node) = item.select(&sel).next() {
                let text = node
                    .value()
                    .attr("data-price")
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(&node));
                let text = text.trim().to_string();
                if !text.is_empty() {
                    price_text = Some(text);
                    break;
                }
            }
        }

        Some(RawProduct {
            name,
            url,
            price_text,
            image,
            item_text: Some(element_text(&item)),
            ..Default::default()
        })
    }

    /// Parse a rendered search-results page. Prefers whole product-item
    /// containers; falls back to product-looking anchors when the markup
    /// shifted under us.
    pub fn parse_listing(html: &str, base_url: &str, limit: usize) -> Result<Vec<RawProduct>, SourceError> {
        let base = Url::parse(base_url).map_err(|e| SourceError::Parse {
            platform: Platform::Cellphones,
            message: format!("invalid base url {base_url}: {e}"),
        })?;
        let document = Html::parse_document(html);

        let mut items: Vec<ElementRef<'_>> = Vec::new();
        for selector in ITEM_SELECTORS {
            items = document.select(&Self::selector(selector)?).collect();
            if !items.is_empty() {
                break;
            }
        }

        let mut products = Vec::new();
        if items.is_empty() {
            let fallback_sel = Self::selector(r#"a.product-item-link, a[href$=".html"]"#)?;
            for anchor in document.select(&fallback_sel) {
                if products.len() >= limit {
                    break;
                }
                let Some(href) = anchor.value().attr("href") else { continue };
                let Ok(url) = base.join(href) else { continue };
                let name = first_non_empty_line(&element_text(&anchor));
                if name.is_empty() {
                    continue;
                }
                products.push(RawProduct {
                    name,
                    url: url.to_string(),
                    ..Default::default()
                });
            }
        } else {
            for item in items {
                if products.len() >= limit {
                    break;
                }
                if let Some(product) = Self::parse_item(item, &base) {
                    products.push(product);
                }
            }
        }

        Ok(products)
    }
}

impl Default for CellphonesExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn urlencode(term: &str) -> String {
    url::form_urlencoded::byte_serialize(term.as_bytes()).collect()
}

#[async_trait]
impl SiteExtractor for CellphonesExtractor {
    fn platform(&self) -> Platform {
        Platform::Cellphones
    }

    async fn extract(
        &self,
        term: &str,
        limit: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<Vec<RawProduct>, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled { platform: Platform::Cellphones });
        }

        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let search_url = Self::search_url(term);

        let render = RenderRequest::new(search_url.clone(), WAIT_SELECTORS);
        let html = tokio::select! {
            result = render_page(render) => {
                result.map_err(|e| SourceError::Browser {
                    platform: Platform::Cellphones,
                    message: e.to_string(),
                })?
            }
            _ = cancel.cancelled() => {
                return Err(SourceError::Cancelled { platform: Platform::Cellphones });
            }
        };

        let products = Self::parse_listing(&html, &search_url, limit)?;
        info!("CellphoneS returned {} products for '{}'", products.len(), term);
        Ok(products)
    }
}
