//! Scripted title fetcher driving a headless browser.
//!
//! For pages that only produce a title after scripts run. Uses
//! chromiumoxide to launch headless Chromium; a batch call launches one
//! browser and reuses it for every URL. Same-page resource loads happen
//! as in any real browser; no outward crawling.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;

use crate::extract::{UrlRecord, extract_title};

use super::{FetchConfig, FetchError, TitleFetcher, TitleMap};

/// Fetches titles through a headless Chromium instance.
pub struct ScriptedTitleFetcher {
    config: FetchConfig,
}

impl ScriptedTitleFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Launch a headless browser and drive its CDP event loop on a
    /// background task.
    async fn launch(&self) -> Result<Browser, FetchError> {
        let browser_config = BrowserConfig::builder()
            .arg(format!("--user-agent={}", self.config.user_agent))
            .build()
            .map_err(FetchError::SourceUnavailable)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::SourceUnavailable(format!("browser launch failed: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        Ok(browser)
    }

    async fn title_from_page(&self, browser: &Browser, url: &UrlRecord) -> Result<String, FetchError> {
        let page = browser
            .new_page(url.normalized.as_str())
            .await
            .map_err(|e| FetchError::Transport { url: url.raw.clone(), reason: e.to_string() })?;

        let title = self.wait_for_title(&page, url).await;
        page.close().await.ok();
        title
    }

    /// Poll the rendered document for a title element until the timeout,
    /// then scan whatever HTML the page has produced.
    async fn wait_for_title(&self, page: &Page, url: &UrlRecord) -> Result<String, FetchError> {
        let waited = tokio::time::timeout(self.config.timeout, async {
            loop {
                if page.find_element("title").await.is_ok() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        })
        .await;

        if waited.is_err() {
            tracing::debug!(url = %url.normalized, "no title element appeared before timeout");
        }

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Transport { url: url.raw.clone(), reason: e.to_string() })?;

        match extract_title(&html) {
            Some(title) => {
                tracing::debug!(url = %url.normalized, title, "title fetched via scripted browser");
                Ok(title)
            }
            None => Err(FetchError::NoTitleFound(url.raw.clone())),
        }
    }
}

#[async_trait]
impl TitleFetcher for ScriptedTitleFetcher {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch_title(&self, url: &UrlRecord) -> Result<String, FetchError> {
        let mut browser = self.launch().await?;
        let result = self.title_from_page(&browser, url).await;
        browser.close().await.ok();
        result
    }

    /// One browser for the whole batch.
    async fn fetch_titles(&self, urls: &[UrlRecord]) -> Result<TitleMap, FetchError> {
        if urls.is_empty() {
            return Ok(TitleMap::new());
        }

        let mut browser = self.launch().await?;

        let mut titles = TitleMap::new();
        let mut last_err = None;
        for url in urls {
            match self.title_from_page(&browser, url).await {
                Ok(title) => {
                    titles.insert(url.raw.clone(), title);
                }
                Err(e) => {
                    tracing::debug!(url = %url.raw, error = %e, "scripted fetch failed");
                    last_err = Some(e);
                }
            }
        }

        browser.close().await.ok();

        match last_err {
            Some(e) if titles.is_empty() => Err(e),
            _ => Ok(titles),
        }
    }
}
