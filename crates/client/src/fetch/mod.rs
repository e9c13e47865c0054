//! Title fetching: the capability trait, its three implementations, and
//! the ordered fallback chain.
//!
//! ### Fetcher variants
//! - `http`: direct GET, response body scanned for a `<title>` element
//!   regardless of HTTP status.
//! - `scripted`: headless Chromium, for pages that only produce a title
//!   after scripts run (feature-gated).
//! - `history`: the local browser history database as an authoritative
//!   title source; no network at all.
//!
//! ### Batch semantics
//! Every variant supports single-URL and batch calls. A batch call that
//! partially fails still returns the titles it found; it only fails when
//! no URL resolved, which is what lets the chain fall through to the
//! next variant.

pub mod chain;
pub mod history;
pub mod http;
#[cfg(feature = "scripted")]
pub mod scripted;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use hollowbeak_core::AppConfig;

use crate::extract::UrlRecord;

pub use chain::FetchChain;
pub use http::HttpTitleFetcher;

/// Titles keyed by the raw matched URL string.
pub type TitleMap = HashMap<String, String>;

/// Per-fetcher failures, recoverable by falling through the chain.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS, TLS, or navigation failure.
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The document ended before a title element with text appeared.
    #[error("no title found for {0}")]
    NoTitleFound(String),

    /// The URL has no visit record in the history database.
    #[error("not found in history: {0}")]
    NotFoundInHistory(String),

    /// The fetcher's backing source (history file, browser binary)
    /// could not be used at all.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Every fetcher in the chain failed; carries the last underlying
    /// error as cause.
    #[error("all fetchers exhausted")]
    AllFetchersExhausted(#[source] Box<FetchError>),
}

/// Configuration shared by the fetcher variants.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User-Agent header sent with HTTP and scripted fetches.
    pub user_agent: String,

    /// Per-fetch timeout.
    pub timeout: Duration,

    /// Maximum response body size in bytes.
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

impl FetchConfig {
    /// Derive fetch settings from the application configuration.
    pub fn from_app(app: &AppConfig) -> Self {
        Self { user_agent: app.user_agent.clone(), timeout: app.timeout(), max_bytes: app.max_bytes }
    }
}

/// The title-resolution capability.
///
/// Implementations hold only the dependencies they need and are
/// independently testable; the chain treats them uniformly.
#[async_trait]
pub trait TitleFetcher: Send + Sync {
    /// Short name used in configuration and logs.
    fn name(&self) -> &'static str;

    /// Resolve the title of a single URL.
    async fn fetch_title(&self, url: &UrlRecord) -> Result<String, FetchError>;

    /// Resolve a batch of URLs.
    ///
    /// URLs that fail are left absent from the returned map. The call as
    /// a whole fails only when no URL resolved, with the last per-URL
    /// error as cause.
    async fn fetch_titles(&self, urls: &[UrlRecord]) -> Result<TitleMap, FetchError> {
        let mut titles = TitleMap::new();
        let mut last_err = None;

        for url in urls {
            match self.fetch_title(url).await {
                Ok(title) => {
                    titles.insert(url.raw.clone(), title);
                }
                Err(e) => {
                    tracing::debug!(fetcher = self.name(), url = %url.raw, error = %e, "fetch failed");
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if titles.is_empty() && !urls.is_empty() => Err(e),
            _ => Ok(titles),
        }
    }
}
