//! Điện Thoại Vui extractor: browser-rendered search pages, parsed with
//! looser container heuristics than CellphoneS because the site mixes
//! several listing layouts.

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
/// Scrape more raw items than the cap; weak items are filtered out
/// before the cap is applied.
const RAW_SCRAPE_LIMIT: usize = 10;

const WAIT_SELECTORS: &[&str] = &[".product-item", ".item-product", ".product-card", "li.item"];
const ITEM_SELECTORS: &[&str] =
    &[".product-item", ".item-product", ".product", ".product-card", "li.item"];
const NAME_SELECTORS: &str = ".name-product, .product-name, .name, .title, h3, h2";
const PRICE_SELECTORS: &[&str] = &[".price", ".product-price", ".price-new", "[data-price]"];

pub struct DienThoaiVuiExtractor;

impl DienThoaiVuiExtractor {
    pub fn new() -> Self {
        Self
    }

    fn search_url(term: &str) -> String {
        format!(
            "https://dienthoaivui.com.vn/tim-kiem?_tim_kiem={}",
            url::form_urlencoded::byte_serialize(term.as_bytes()).collect::<String>()
        )
    }

    fn selector(raw: &str) -> Result<Selector, SourceError> {
        Selector::parse(raw).map_err(|e| SourceError::Parse {
            platform: Platform::DienThoaiVui,
            message: format!("invalid selector {raw}: {e}"),
        })
    }

    fn parse_item(item: ElementRef<'_>, base: &Url) -> Option<RawProduct> {
        let anchor_sel = Selector::parse("a[href]").ok()?;
        let name_sel = Selector::parse(NAME_SELECTORS).ok()?;
        let img_sel = Selector::parse("img").ok()?;

        let anchor = item.select(&anchor_sel).next()?;
        let href = anchor.value().attr("href")?;
        let url = base.join(href).ok()?.to_string();

        // Prefer a dedicated name node over the anchor's full text, which
        // often carries price and promo lines too.
        let name = item
            .select(&name_sel)
            .next()
            .map(|node| first_non_empty_line(&element_text(&node)))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| first_non_empty_line(&element_text(&anchor)));
        if name.len() < 2 {
            return None;
        }

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

    pub fn parse_listing(html: &str, base_url: &str, limit: usize) -> Result<Vec<RawProduct>, SourceError> {
        let base = Url::parse(base_url).map_err(|e| SourceError::Parse {
            platform: Platform::DienThoaiVui,
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

        let mut seen = std::collections::HashSet::new();
        let mut products = Vec::new();
        for item in items.into_iter().take(RAW_SCRAPE_LIMIT) {
            if products.len() >= limit {
                break;
            }
            let Some(product) = Self::parse_item(item, &base) else { continue };
            if seen.insert(product.url.clone()) {
                products.push(product);
            }
        }

        Ok(products)
    }
}

impl Default for DienThoaiVuiExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteExtractor for DienThoaiVuiExtractor {
    fn platform(&self) -> Platform {
        Platform::DienThoaiVui
    }

    async fn extract(
        &self,
        term: &str,
        limit: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<Vec<RawProduct>, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled { platform: Platform::DienThoaiVui });
        }

        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let search_url = Self::search_url(term);

        let render = RenderRequest::new(search_url.clone(), WAIT_SELECTORS);
        let html = tokio::select! {
            result = render_page(render) => {
                result.map_err(|e| SourceError::Browser {
                    platform: Platform::DienThoaiVui,
                    message: e.to_string(),
                })?
            }
            _ = cancel.cancelled() => {
                return Err(SourceError::Cancelled { platform: Platform::DienThoaiVui });
            }
        };

        let products = Self::parse_listing(&html, &search_url, limit)?;
        info!("Điện Thoại Vui returned {} products for '{}'", products.len(), term);
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <ul>
          <li class="item">
            <a href="/iphone-14-pro-cu">
              <h3 class="name-product">iPhone 14 Pro 128GB cũ đẹp</h3>
              <img src="//cdn.dienthoaivui.com.vn/ip14.jpg" />
              <span class="price">18.490.000 đ</span>
              <span>4.7 sao (89 đánh giá)</span>
            </a>
          </li>
          <li class="item">
            <a href="/iphone-14-pro-cu">
              <h3 class="name-product">iPhone 14 Pro 128GB cũ đẹp (trùng)</h3>
            </a>
          </li>
          <li class="item">
            <a href="/x"><h3 class="name-product">A</h3></a>
          </li>
        </ul>
    "#;

    #[test]
    fn parses_items_dedups_urls_and_drops_short_names() {
        let products = DienThoaiVuiExtractor::parse_listing(
            LISTING,
            "https://dienthoaivui.com.vn/tim-kiem?_tim_kiem=iphone",
            5,
        )
        .unwrap();

        // Second item shares the first one's URL; third has a 1-char name.
        assert_eq!(products.len(), 1);
        let product = &products[0];
        assert_eq!(product.name, "iPhone 14 Pro 128GB cũ đẹp");
        assert_eq!(product.url, "https://dienthoaivui.com.vn/iphone-14-pro-cu");
        assert_eq!(product.price_text.as_deref(), Some("18.490.000 đ"));
        assert_eq!(product.image.as_deref(), Some("https://cdn.dienthoaivui.com.vn/ip14.jpg"));
        assert!(product.item_text.as_deref().unwrap().contains("4.7 sao"));
    }

    #[test]
    fn no_listing_containers_yields_empty() {
        let products = DienThoaiVuiExtractor::parse_listing(
            "<html><body><p>Không tìm thấy</p></body></html>",
            "https://dienthoaivui.com.vn/",
            5,
        )
        .unwrap();
        assert!(products.is_empty());
    }
}
