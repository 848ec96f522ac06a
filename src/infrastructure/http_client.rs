//! Rate-limited HTTP client shared by the API and static-HTML extractors.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use tokio_util::sync::CancellationToken;

use crate::infrastructure::config::HttpClientConfig;

/// HTTP client with per-second rate limiting so concurrent extractors
/// stay polite toward the target sites.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self { client, rate_limiter: RateLimiter::direct(quota), config })
    }

    /// Fetch a URL, waiting for the rate limiter first.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.rate_limiter.until_ready().await;

        tracing::debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP request failed with status {}: {}", response.status(), url);
        }

        Ok(response)
    }

    /// Fetch a URL and parse the body as JSON.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let response = self.get(url).await?;
        response
            .json::<serde_json::Value>()
            .await
            .with_context(|| format!("Failed to parse JSON body from: {url}"))
    }

    /// Fetch a URL's body as text with cancellation support at every
    /// suspension point.
    pub async fn get_text_with_cancellation(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if cancel.is_cancelled() {
            anyhow::bail!("Request cancelled before starting");
        }

        tokio::select! {
            _ = self.rate_limiter.until_ready() => {},
            _ = cancel.cancelled() => anyhow::bail!("Request cancelled during rate limiting"),
        }

        let response = tokio::select! {
            result = self.client.get(url).send() => {
                result.with_context(|| format!("Failed to fetch URL: {url}"))?
            },
            _ = cancel.cancelled() => anyhow::bail!("HTTP request cancelled: {url}"),
        };

        if !response.status().is_success() {
            anyhow::bail!("HTTP request failed with status {}: {}", response.status(), url);
        }

        let text = tokio::select! {
            result = response.text() => {
                result.with_context(|| format!("Failed to read response body from: {url}"))?
            },
            _ = cancel.cancelled() => anyhow::bail!("Response reading cancelled: {url}"),
        };

        tracing::debug!("Fetched {} ({} chars)", url, text.len());
        Ok(text)
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
