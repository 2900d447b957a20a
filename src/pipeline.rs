//! Listing fetch pipeline.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use url::Url;

use crate::client::HttpClient;
use crate::document::DocumentAdapter;
use crate::{Provider, ProxyFetcherError, ProxyRecord, Result};

/// Fetches a provider's listing pages and extracts proxy records.
///
/// Pages are fetched in order with the given HTTP client, parsed with the
/// given adapter and handed to the provider for extraction. Any failure
/// aborts the run and is reported as [`ProxyFetcherError::Fetch`].
pub struct Fetcher {
    provider: Arc<dyn Provider>,
    client: Arc<dyn HttpClient>,
    adapter: Arc<dyn DocumentAdapter>,
}

impl Fetcher {
    pub fn new(
        provider: Arc<dyn Provider>,
        client: Arc<dyn HttpClient>,
        adapter: Arc<dyn DocumentAdapter>,
    ) -> Self {
        Self {
            provider,
            client,
            adapter,
        }
    }

    /// Runs the pipeline once.
    pub async fn fetch(&self) -> Result<Vec<ProxyRecord>> {
        let name = self.provider.name().to_string();
        let start = Instant::now();
        let urls = self.provider.listing_urls();
        debug!("{}: fetching {} listing page(s)", name, urls.len());

        let mut records = Vec::new();
        for url in &urls {
            let page = self
                .fetch_page(url)
                .await
                .map_err(|e| ProxyFetcherError::fetch(name.as_str(), e))?;
            debug!("{}: {} record(s) from {}", name, page.len(), url);
            records.extend(page);
        }

        info!(
            "{}: fetched {} proxies in {}ms",
            name,
            records.len(),
            start.elapsed().as_millis()
        );
        Ok(records)
    }

    async fn fetch_page(&self, url: &str) -> Result<Vec<ProxyRecord>> {
        Url::parse(url)
            .map_err(|e| ProxyFetcherError::Parse(format!("Invalid listing URL '{}': {}", url, e)))?;
        let body = self.client.fetch(url).await?;
        // The parsed document is not Send; it must not live across an await.
        let document = self.adapter.parse(&body)?;
        self.provider.extract(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, LineAdapter, Node};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapClient {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl MapClient {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for MapClient {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ProxyFetcherError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    struct PagedProvider {
        urls: Vec<String>,
    }

    impl PagedProvider {
        fn new(urls: &[&str]) -> Self {
            Self {
                urls: urls.iter().map(|u| u.to_string()).collect(),
            }
        }
    }

    impl Provider for PagedProvider {
        fn name(&self) -> &str {
            "paged"
        }

        fn listing_urls(&self) -> Vec<String> {
            self.urls.clone()
        }

        fn extract(&self, document: &Document) -> Result<Vec<ProxyRecord>> {
            let mut records = Vec::new();
            for row in document.find_all("row")? {
                let cells = row.cells("cell")?;
                if let [host, port, ..] = cells.as_slice() {
                    records.push(ProxyRecord::parse(host, port)?);
                }
            }
            Ok(records)
        }
    }

    fn fetcher(provider: PagedProvider, client: Arc<MapClient>) -> Fetcher {
        Fetcher::new(Arc::new(provider), client, Arc::new(LineAdapter::new()))
    }

    #[tokio::test]
    async fn test_fetch_pages_in_order() {
        let client = Arc::new(MapClient::new(&[
            ("https://example.com/1", "1.1.1.1:80\n2.2.2.2:8080"),
            ("https://example.com/2", "3.3.3.3:3128"),
        ]));
        let provider = PagedProvider::new(&["https://example.com/1", "https://example.com/2"]);

        let records = fetcher(provider, Arc::clone(&client)).fetch().await.unwrap();

        let addrs: Vec<_> = records.iter().map(|r| r.addr()).collect();
        assert_eq!(addrs, vec!["1.1.1.1:80", "2.2.2.2:8080", "3.3.3.3:3128"]);
        assert_eq!(client.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_no_urls() {
        let client = Arc::new(MapClient::new(&[]));
        let records = fetcher(PagedProvider::new(&[]), client).fetch().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_wraps_cause() {
        let client = Arc::new(MapClient::new(&[("https://example.com/1", "1.1.1.1:80")]));
        let provider = PagedProvider::new(&["https://example.com/1", "https://example.com/missing"]);

        let err = fetcher(provider, client).fetch().await.unwrap_err();
        match err {
            ProxyFetcherError::Fetch { provider, source } => {
                assert_eq!(provider, "paged");
                assert!(matches!(*source, ProxyFetcherError::Status { status: 404, .. }));
            }
            other => panic!("Expected Fetch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_is_not_requested() {
        let client = Arc::new(MapClient::new(&[]));
        let err = fetcher(PagedProvider::new(&["not a url"]), Arc::clone(&client))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyFetcherError::Fetch { .. }));
        assert!(client.requested.lock().unwrap().is_empty());
    }
}
