//! Pipeline orchestration: extract, consult the cache, resolve misses
//! through the fetch chain, store back, render.
//!
//! A failed URL never aborts the run; it surfaces as an empty title and
//! a logged warning. When caching is enabled the cache is cleaned up and
//! persisted exactly once at the end, whether or not fetches succeeded.

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use hollowbeak_client::{FetchChain, UrlGrammar, UrlRecord, extract_urls};
use hollowbeak_core::{AppConfig, Error, TitleCache};

use crate::render::{self, OutputFormat};

/// The externally visible result unit: one per extracted URL, in source
/// order. `title` is empty when every fetcher failed for the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRecord {
    pub url: String,
    pub title: String,
}

/// Where the source text comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    File(PathBuf),
    Args(Vec<String>),
}

/// Run-scoped options supplied by the CLI layer.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: InputSource,
    pub output: String,
    pub fetchers: Vec<String>,
    pub no_cache: bool,
    pub grammar: UrlGrammar,
}

/// Resolve a title for every extracted URL occurrence.
///
/// Cache lookups happen per occurrence; unresolved URLs are deduplicated
/// and sent through the chain as one batch. Results are slotted by
/// extraction position, so output order always matches source order.
/// With `cache = None` no cache call of any kind happens.
pub async fn resolve_titles(
    urls: &[UrlRecord], chain: &FetchChain, mut cache: Option<&mut TitleCache>,
) -> Vec<TitleRecord> {
    let mut titles: Vec<Option<String>> = vec![None; urls.len()];

    if let Some(cache) = cache.as_deref_mut() {
        for (slot, url) in titles.iter_mut().zip(urls) {
            if let Some(title) = cache.get(&url.raw) {
                tracing::debug!(url = %url.raw, title, "title served from cache");
                *slot = Some(title);
            }
        }
    }

    let mut seen = HashSet::new();
    let misses: Vec<UrlRecord> = urls
        .iter()
        .zip(&titles)
        .filter(|(url, title)| title.is_none() && seen.insert(url.raw.clone()))
        .map(|(url, _)| url.clone())
        .collect();

    if !misses.is_empty() {
        match chain.resolve(&misses).await {
            Ok(resolved) => {
                for (slot, url) in titles.iter_mut().zip(urls) {
                    if slot.is_none()
                        && let Some(title) = resolved.get(&url.raw)
                    {
                        *slot = Some(title.clone());
                    }
                }
                if let Some(cache) = cache.as_deref_mut() {
                    for (url, title) in &resolved {
                        if !title.is_empty() {
                            cache.set(url, title);
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, urls = misses.len(), "title resolution failed, continuing with empty titles");
            }
        }
    }

    urls.iter()
        .zip(titles)
        .map(|(url, title)| TitleRecord { url: url.raw.clone(), title: title.unwrap_or_default() })
        .collect()
}

/// Read the source text into memory.
fn read_input(input: &InputSource) -> Result<String, Error> {
    match input {
        InputSource::File(path) => std::fs::read_to_string(path)
            .map_err(|e| Error::InputUnavailable(format!("failed to read {}: {e}", path.display()))),
        InputSource::Args(args) => {
            if args.is_empty() {
                return Err(Error::InputUnavailable(
                    "no input text given; pass TEXT arguments or --input FILE".to_string(),
                ));
            }
            Ok(args.join("\n"))
        }
    }
}

/// Execute one full run and write the rendered result to stdout.
pub async fn run(app: &AppConfig, opts: &RunOptions) -> Result<(), Error> {
    let format = OutputFormat::from_str(&opts.output)?;
    let chain = FetchChain::from_names(&opts.fetchers, app)?;

    let text = read_input(&opts.input)?;
    let urls = extract_urls(&text, opts.grammar);
    tracing::info!(count = urls.len(), "extracted URLs");

    let mut cache = if opts.no_cache {
        tracing::debug!("cache disabled for this run");
        None
    } else {
        let cache = match &app.cache_path {
            Some(path) => TitleCache::open(path, app.cache_ttl())?,
            None => TitleCache::open_default(app.cache_ttl())?,
        };
        Some(cache)
    };

    let records = resolve_titles(&urls, &chain, cache.as_mut()).await;

    // Best effort: resolved titles still render if the save fails.
    if let Some(cache) = cache.as_mut()
        && let Err(e) = cache.cleanup_and_save()
    {
        tracing::warn!(error = %e, path = %cache.path().display(), "failed to save cache");
    }

    print!("{}", render::render(format, &records));
    Ok(())
}
