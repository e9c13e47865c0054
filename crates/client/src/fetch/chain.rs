//! Ordered fallback across fetcher variants.
//!
//! Fetchers are tried in configured order with the whole batch. The
//! first call that returns `Ok` is final, even when only part of the
//! batch resolved: fallback is batch-level, never per-URL. A fetcher
//! that resolves nothing fails its batch call, and the chain moves on.

use hollowbeak_core::{AppConfig, Error};

use crate::extract::UrlRecord;

use super::history::HistoryTitleFetcher;
use super::{FetchConfig, FetchError, HttpTitleFetcher, TitleFetcher, TitleMap};

/// Recognized fetcher variant names, in the default fallback order.
pub const DEFAULT_FETCHER_ORDER: &[&str] = &["history", "scripted", "http"];

/// An ordered, non-empty list of fetchers with first-success fallback.
pub struct FetchChain {
    fetchers: Vec<Box<dyn TitleFetcher>>,
}

impl FetchChain {
    /// Build a chain from already-constructed fetchers.
    pub fn new(fetchers: Vec<Box<dyn TitleFetcher>>) -> Result<Self, Error> {
        if fetchers.is_empty() {
            return Err(Error::NoFetchersConfigured("fetcher list is empty".to_string()));
        }
        Ok(Self { fetchers })
    }

    /// Build a chain from configured variant names, in order.
    ///
    /// Recognized names: `http`, `scripted`, `history`. An empty list or
    /// an unrecognized name fails with [`Error::NoFetchersConfigured`].
    pub fn from_names(names: &[String], app: &AppConfig) -> Result<Self, Error> {
        if names.is_empty() {
            return Err(Error::NoFetchersConfigured("fetcher list is empty".to_string()));
        }

        let config = FetchConfig::from_app(app);
        let mut fetchers: Vec<Box<dyn TitleFetcher>> = Vec::with_capacity(names.len());

        for name in names {
            match name.as_str() {
                "http" => {
                    let fetcher = HttpTitleFetcher::new(&config)
                        .map_err(|e| Error::FetcherInit { name: name.clone(), reason: e.to_string() })?;
                    fetchers.push(Box::new(fetcher));
                }
                #[cfg(feature = "scripted")]
                "scripted" => {
                    fetchers.push(Box::new(super::scripted::ScriptedTitleFetcher::new(&config)));
                }
                #[cfg(not(feature = "scripted"))]
                "scripted" => {
                    return Err(Error::NoFetchersConfigured(
                        "this build does not include the 'scripted' fetcher".to_string(),
                    ));
                }
                "history" => {
                    fetchers.push(Box::new(HistoryTitleFetcher::new(app.history_db_path.clone())));
                }
                other => {
                    return Err(Error::NoFetchersConfigured(format!("unrecognized fetcher '{other}'")));
                }
            }
        }

        Self::new(fetchers)
    }

    /// Names of the configured fetchers, in order.
    pub fn fetcher_names(&self) -> Vec<&'static str> {
        self.fetchers.iter().map(|f| f.name()).collect()
    }

    /// Resolve a batch through the chain.
    ///
    /// Returns the first fetcher's successful map; on total failure,
    /// [`FetchError::AllFetchersExhausted`] wrapping the last fetcher's
    /// error.
    pub async fn resolve(&self, urls: &[UrlRecord]) -> Result<TitleMap, FetchError> {
        if urls.is_empty() {
            return Ok(TitleMap::new());
        }

        let mut last_err = None;
        for fetcher in &self.fetchers {
            match fetcher.fetch_titles(urls).await {
                Ok(titles) => {
                    tracing::info!(
                        fetcher = fetcher.name(),
                        resolved = titles.len(),
                        requested = urls.len(),
                        "fetcher answered the batch"
                    );
                    return Ok(titles);
                }
                Err(e) => {
                    tracing::debug!(fetcher = fetcher.name(), error = %e, "fetcher failed, trying next");
                    last_err = Some(e);
                }
            }
        }

        // The chain is non-empty and urls is non-empty, so a failure was
        // recorded on every iteration.
        let cause = last_err.unwrap_or_else(|| FetchError::NoTitleFound(urls[0].raw.clone()));
        Err(FetchError::AllFetchersExhausted(Box::new(cause)))
    }
}
