//! Headless Chromium rendering for sites that only populate their search
//! listings client-side.
//!
//! Rendering is blocking CDP work, so it runs on the blocking pool. The
//! `Browser` and `Tab` handles live only inside the blocking closure and
//! are dropped on every exit path, including errors, so repeated
//! invocations never leak Chromium processes.

use std::time::Duration;

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions};
use tracing::debug;

/// One page-render request.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: String,
    /// Candidate selectors that signal the listing has loaded; the first
    /// one that appears wins, and none appearing is not fatal (the page
    /// content is still collected).
    pub wait_selectors: Vec<String>,
    pub selector_timeout: Duration,
}

impl RenderRequest {
    pub fn new(url: impl Into<String>, wait_selectors: &[&str]) -> Self {
        Self {
            url: url.into(),
            wait_selectors: wait_selectors.iter().map(|s| (*s).to_string()).collect(),
            selector_timeout: Duration::from_secs(3),
        }
    }
}

/// Render a page and return its HTML after client-side hydration.
pub async fn render_page(request: RenderRequest) -> Result<String> {
    tokio::task::spawn_blocking(move || render_blocking(&request))
        .await
        .context("Browser rendering task panicked")?
}

fn render_blocking(request: &RenderRequest) -> Result<String> {
    let browser = Browser::new(LaunchOptions { headless: true, ..Default::default() })
        .context("Failed to launch headless Chromium")?;

    let tab = browser.new_tab().context("Failed to open browser tab")?;
    tab.navigate_to(&request.url)
        .with_context(|| format!("Failed to navigate to {}", request.url))?;
    tab.wait_until_navigated()
        .with_context(|| format!("Navigation never settled for {}", request.url))?;

    for selector in &request.wait_selectors {
        if tab
            .wait_for_element_with_custom_timeout(selector, request.selector_timeout)
            .is_ok()
        {
            debug!("Listing selector appeared: {}", selector);
            break;
        }
    }

    tab.get_content()
        .with_context(|| format!("Failed to read rendered content of {}", request.url))
}
