//! Title lookups against the local browser history database.
//!
//! The history file is a live SQLite database owned by the browser, so
//! it is copied to a temporary snapshot first and the snapshot opened
//! read-only. One `visits INNER JOIN urls` query answers the whole
//! batch, most recent visit first.
//!
//! Chrome stores visit times as Windows-epoch microseconds; conversion
//! to Unix time is `t / 1_000_000 - 11_644_473_600`.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio_rusqlite::Connection;
use tokio_rusqlite::rusqlite::{self, OpenFlags};

use crate::extract::UrlRecord;

use super::{FetchError, TitleFetcher, TitleMap};

const WINDOWS_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Resolves titles from browser history instead of the network.
pub struct HistoryTitleFetcher {
    history_path: Option<PathBuf>,
}

/// One visit row, newest visit per URL.
struct HistoryItem {
    title: String,
    last_visit: DateTime<Utc>,
}

impl HistoryTitleFetcher {
    /// `path` overrides the platform's Chrome default-profile History
    /// file.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { history_path: path }
    }

    fn resolved_path(&self) -> Result<PathBuf, FetchError> {
        if let Some(path) = &self.history_path {
            return Ok(path.clone());
        }
        default_history_path()
            .ok_or_else(|| FetchError::SourceUnavailable("could not locate a browser history database".to_string()))
    }

    /// Copy the live database to a temp snapshot so the browser's own
    /// writer is never contended.
    async fn snapshot(&self) -> Result<tempfile::NamedTempFile, FetchError> {
        let src = self.resolved_path()?;
        tracing::debug!(path = %src.display(), "snapshotting history database");

        let bytes = tokio::fs::read(&src)
            .await
            .map_err(|e| FetchError::SourceUnavailable(format!("failed to read {}: {e}", src.display())))?;

        let mut snapshot = tempfile::NamedTempFile::new()
            .map_err(|e| FetchError::SourceUnavailable(format!("failed to create snapshot: {e}")))?;
        snapshot
            .write_all(&bytes)
            .map_err(|e| FetchError::SourceUnavailable(format!("failed to write snapshot: {e}")))?;

        Ok(snapshot)
    }

    /// Query visit records for the given URL strings. Rows arrive most
    /// recent first; the first row per URL wins.
    async fn query_history(&self, lookup_urls: Vec<String>) -> Result<HashMap<String, HistoryItem>, FetchError> {
        // Declared before the connection so it is deleted only after the
        // connection has closed.
        let snapshot = self.snapshot().await?;

        let conn = Connection::open_with_flags(snapshot.path(), OpenFlags::SQLITE_OPEN_READ_ONLY)
            .await
            .map_err(|e| FetchError::SourceUnavailable(format!("failed to open history snapshot: {e}")))?;

        let placeholders = vec!["?"; lookup_urls.len()].join(",");
        let query = format!(
            "SELECT visits.visit_time, urls.url, urls.title
             FROM visits INNER JOIN urls ON visits.url = urls.id
             WHERE urls.url IN ({placeholders})
             ORDER BY visits.visit_time DESC"
        );
        tracing::trace!(query, "prepared history query");

        let rows = conn
            .call(move |conn| -> Result<Vec<(i64, String, String)>, rusqlite::Error> {
                let mut stmt = conn.prepare(&query)?;
                let mapped = stmt.query_map(rusqlite::params_from_iter(lookup_urls.iter()), |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?;
                mapped.collect()
            })
            .await
            .map_err(|e| FetchError::SourceUnavailable(format!("history query failed: {e}")))?;

        let now = Utc::now();
        let mut items: HashMap<String, HistoryItem> = HashMap::new();
        for (visit_time, url, title) in rows {
            if items.contains_key(&url) {
                continue;
            }
            let last_visit = windows_epoch_to_utc(visit_time);
            tracing::debug!(
                url,
                title,
                last_visit = format_relative_time(now, last_visit),
                "found title in history"
            );
            items.insert(url, HistoryItem { title, last_visit });
        }

        tracing::debug!(count = items.len(), "history lookup finished");
        Ok(items)
    }
}

#[async_trait]
impl TitleFetcher for HistoryTitleFetcher {
    fn name(&self) -> &'static str {
        "history"
    }

    async fn fetch_title(&self, url: &UrlRecord) -> Result<String, FetchError> {
        let titles = self.fetch_titles(std::slice::from_ref(url)).await?;
        titles
            .get(&url.raw)
            .cloned()
            .ok_or_else(|| FetchError::NotFoundInHistory(url.raw.clone()))
    }

    async fn fetch_titles(&self, urls: &[UrlRecord]) -> Result<TitleMap, FetchError> {
        if urls.is_empty() {
            return Ok(TitleMap::new());
        }

        // History rows key on the full stored URL, so try both the raw
        // match and its normalized form.
        let mut lookup_urls = Vec::new();
        for url in urls {
            lookup_urls.push(url.normalized.clone());
            if url.raw != url.normalized {
                lookup_urls.push(url.raw.clone());
            }
        }
        lookup_urls.dedup();

        let items = self.query_history(lookup_urls).await?;

        let mut titles = TitleMap::new();
        for url in urls {
            let item = items.get(&url.normalized).or_else(|| items.get(&url.raw));
            match item {
                Some(item) => {
                    titles.insert(url.raw.clone(), item.title.clone());
                }
                None => {
                    tracing::debug!(url = %url.raw, "no visit record in history");
                }
            }
        }

        if titles.is_empty() {
            return Err(FetchError::NotFoundInHistory(urls[0].raw.clone()));
        }
        Ok(titles)
    }
}

/// Chrome default-profile History file for the current platform.
fn default_history_path() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::config_dir().map(|d| d.join("Google/Chrome/Default/History"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir().map(|d| d.join("Google/Chrome/User Data/Default/History"))
    } else {
        dirs::config_dir().map(|d| d.join("google-chrome/Default/History"))
    }
}

fn windows_epoch_to_utc(micros: i64) -> DateTime<Utc> {
    let unix_secs = micros / 1_000_000 - WINDOWS_EPOCH_OFFSET_SECS;
    DateTime::from_timestamp(unix_secs, 0).unwrap_or_default()
}

/// Human-readable recency of a visit, for diagnostics.
fn format_relative_time(now: DateTime<Utc>, visit: DateTime<Utc>) -> String {
    let elapsed = (now - visit).max(TimeDelta::zero());

    if elapsed < TimeDelta::minutes(1) {
        let seconds = elapsed.num_seconds();
        format!("{seconds} {} ago", pluralize("second", seconds))
    } else if elapsed < TimeDelta::hours(1) {
        let minutes = elapsed.num_minutes();
        format!("{minutes} {} ago", pluralize("minute", minutes))
    } else if elapsed < TimeDelta::days(1) {
        let hours = elapsed.num_hours();
        format!("{hours} {} ago", pluralize("hour", hours))
    } else {
        let days = elapsed.num_days();
        format!("{days} {} ago", pluralize("day", days))
    }
}

fn pluralize(word: &str, count: i64) -> String {
    if count == 1 { word.to_string() } else { format!("{word}s") }
}
