//! Direct HTTP title fetcher.

use async_trait::async_trait;

use crate::extract::{UrlRecord, extract_title};

use super::{FetchConfig, FetchError, TitleFetcher};

/// Fetches titles with a plain GET and an HTML scan of the body.
///
/// Any reachable response is scanned regardless of HTTP status: error
/// pages and redirect landing pages carry titles too. Bodies larger than
/// the configured cap are truncated before scanning; the title element
/// sits in the document head in practice.
pub struct HttpTitleFetcher {
    http: reqwest::Client,
    max_bytes: usize,
}

impl HttpTitleFetcher {
    /// Build a client with the configured User-Agent and timeout.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::SourceUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, max_bytes: config.max_bytes })
    }
}

#[async_trait]
impl TitleFetcher for HttpTitleFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_title(&self, url: &UrlRecord) -> Result<String, FetchError> {
        tracing::debug!(url = %url.normalized, "fetching title over HTTP");

        let mut response = self
            .http
            .get(&url.normalized)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| FetchError::Transport { url: url.raw.clone(), reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url.normalized, status = %status, "non-success response, scanning anyway");
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Transport { url: url.raw.clone(), reason: e.to_string() })?
        {
            let remaining = self.max_bytes - body.len();
            if chunk.len() >= remaining {
                body.extend_from_slice(&chunk[..remaining]);
                tracing::debug!(url = %url.normalized, max_bytes = self.max_bytes, "body truncated at cap");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        let html = String::from_utf8_lossy(&body);
        match extract_title(&html) {
            Some(title) => {
                tracing::debug!(url = %url.normalized, title, "title fetched over HTTP");
                Ok(title)
            }
            None => Err(FetchError::NoTitleFound(url.raw.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;

            let response = format!(
                "{status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
        });

        format!("http://{addr}/")
    }

    fn record(url: &str) -> UrlRecord {
        UrlRecord { raw: url.to_string(), normalized: url.to_string() }
    }

    fn fetcher() -> HttpTitleFetcher {
        HttpTitleFetcher::new(&FetchConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_title_ok() {
        let url = serve_once(
            "HTTP/1.1 200 OK",
            "<html><head><title>Local Page</title></head><body></body></html>",
        )
        .await;

        let title = fetcher().fetch_title(&record(&url)).await.unwrap();
        assert_eq!(title, "Local Page");
    }

    #[tokio::test]
    async fn test_fetch_title_scans_error_pages() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found",
            "<html><head><title>Not Found Here</title></head></html>",
        )
        .await;

        let title = fetcher().fetch_title(&record(&url)).await.unwrap();
        assert_eq!(title, "Not Found Here");
    }

    #[tokio::test]
    async fn test_fetch_title_no_title() {
        let url = serve_once("HTTP/1.1 200 OK", "<html><body><p>bare</p></body></html>").await;

        let result = fetcher().fetch_title(&record(&url)).await;
        assert!(matches!(result, Err(FetchError::NoTitleFound(_))));
    }

    #[tokio::test]
    async fn test_fetch_title_connection_refused() {
        // Nothing listens on this port; bind and drop to reserve an address.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = fetcher().fetch_title(&record(&format!("http://{addr}/"))).await;
        assert!(matches!(result, Err(FetchError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_batch_partial_failure() {
        let ok_url = serve_once(
            "HTTP/1.1 200 OK",
            "<html><head><title>Batch Page</title></head></html>",
        )
        .await;
        let bad_url = serve_once("HTTP/1.1 200 OK", "<html><body>no title</body></html>").await;

        let urls = [record(&ok_url), record(&bad_url)];
        let titles = fetcher().fetch_titles(&urls).await.unwrap();

        assert_eq!(titles.len(), 1);
        assert_eq!(titles[&ok_url], "Batch Page");
    }
}
