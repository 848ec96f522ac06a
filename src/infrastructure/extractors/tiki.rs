//! Tiki extractor: the one structured source, backed by the public
//! marketplace search API.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::domain::product::{Platform, RawProduct};
use crate::domain::services::{SiteExtractor, SourceError};
use crate::infrastructure::http_client::HttpClient;

const SEARCH_API: &str = "https://tiki.vn/api/v2/products";
const DEFAULT_LIMIT: usize = 5;

pub struct TikiExtractor {
    client: Arc<HttpClient>,
}

impl TikiExtractor {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    fn search_url(term: &str, limit: usize) -> Result<Url, SourceError> {
        Url::parse_with_params(
            SEARCH_API,
            &[
                ("q", term),
                ("limit", &limit.to_string()),
                ("sort", "score,price,asc"),
                ("aggregations", "1"),
            ],
        )
        .map_err(|e| SourceError::Parse {
            platform: Platform::Tiki,
            message: format!("invalid search url: {e}"),
        })
    }

    fn parse_items(payload: &Value, limit: usize) -> Result<Vec<RawProduct>, SourceError> {
        let items = payload
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| SourceError::Parse {
                platform: Platform::Tiki,
                message: "response has no data array".into(),
            })?;

        let mut products = Vec::new();
        for item in items {
            if products.len() >= limit {
                break;
            }

            // Items missing any of name/price/url_path are unusable.
            let Some(name) = item.get("name").and_then(Value::as_str).filter(|n| !n.is_empty())
            else {
                continue;
            };
            let Some(price) = item.get("price").and_then(Value::as_i64).filter(|&p| p > 0)
            else {
                continue;
            };
            let Some(url_path) =
                item.get("url_path").and_then(Value::as_str).filter(|u| !u.is_empty())
            else {
                continue;
            };

            let seller = item
                .pointer("/seller/name")
                .and_then(Value::as_str)
                .or_else(|| item.get("seller_name").and_then(Value::as_str))
                .map(str::to_string);

            products.push(RawProduct {
                name: name.trim().to_string(),
                url: format!("https://tiki.vn/{}", url_path.trim_start_matches('/')),
                price_value: Some(price),
                original_price: item.get("original_price").and_then(Value::as_i64),
                discount_rate: item.get("discount_rate").and_then(Value::as_i64),
                seller,
                rating_value: item.get("rating_average").and_then(Value::as_f64),
                review_count: item.get("review_count").and_then(Value::as_i64),
                image: item
                    .get("thumbnail_url")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                ..Default::default()
            });
        }

        Ok(products)
    }
}

#[async_trait]
impl SiteExtractor for TikiExtractor {
    fn platform(&self) -> Platform {
        Platform::Tiki
    }

    async fn extract(
        &self,
        term: &str,
        limit: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<Vec<RawProduct>, SourceError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        let url = Self::search_url(term, limit)?;
        debug!("Searching Tiki: {}", url);

        let payload = tokio::select! {
            result = self.client.get_json(url.as_str()) => {
                result.map_err(|e| SourceError::Unreachable {
                    platform: Platform::Tiki,
                    message: e.to_string(),
                })?
            }
            _ = cancel.cancelled() => {
                return Err(SourceError::Cancelled { platform: Platform::Tiki });
            }
        };

        let products = Self::parse_items(&payload, limit)?;
        info!("Tiki returned {} products for '{}'", products.len(), term);
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_complete_items_and_skips_incomplete_ones() {
        let payload = json!({
            "data": [
                {
                    "name": "iPhone 14 Pro 128GB",
                    "price": 25_990_000,
                    "original_price": 28_990_000,
                    "discount_rate": 10,
                    "url_path": "iphone-14-pro-128gb-p190000.html",
                    "rating_average": 4.9,
                    "review_count": 412,
                    "seller": {"name": "Tiki Trading"}
                },
                {"name": "Missing price", "url_path": "x.html"},
                {"price": 1_000_000, "url_path": "no-name.html"},
                {
                    "name": "Ốp lưng iPhone 14",
                    "price": 99_000,
                    "url_path": "/op-lung.html",
                    "seller_name": "PhuKien Shop"
                }
            ]
        });

        let items = TikiExtractor::parse_items(&payload, 5).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].name, "iPhone 14 Pro 128GB");
        assert_eq!(items[0].price_value, Some(25_990_000));
        assert_eq!(items[0].discount_rate, Some(10));
        assert_eq!(items[0].seller.as_deref(), Some("Tiki Trading"));
        assert_eq!(items[0].url, "https://tiki.vn/iphone-14-pro-128gb-p190000.html");

        // Leading slash in url_path does not double up.
        assert_eq!(items[1].url, "https://tiki.vn/op-lung.html");
        assert_eq!(items[1].seller.as_deref(), Some("PhuKien Shop"));
    }

    #[test]
    fn soft_cap_limits_parsed_items() {
        let data: Vec<_> = (0..10)
            .map(|i| {
                json!({"name": format!("P{i}"), "price": 1000 + i, "url_path": format!("p{i}.html")})
            })
            .collect();
        let payload = json!({ "data": data });

        let items = TikiExtractor::parse_items(&payload, 5).unwrap();
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn missing_data_array_is_a_parse_failure() {
        let payload = json!({"error": "rate limited"});
        let err = TikiExtractor::parse_items(&payload, 5).unwrap_err();
        assert!(matches!(err, SourceError::Parse { platform: Platform::Tiki, .. }));
    }
}
