//! Default HTTP client using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::client::HttpClient;
use crate::{ProxyFetcherError, Result};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Default timeout for loading a listing page.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// An HTTP client that fetches listings with plain reqwest requests.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a new `ReqwestClient` with default settings.
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_USER_AGENT, DEFAULT_CLIENT_TIMEOUT)
    }

    /// Creates a client with the given user agent and request timeout.
    pub fn with_settings(user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Creates a `ReqwestClient` with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProxyFetcherError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_client_new() {
        let _client = ReqwestClient::new();
    }

    #[test]
    fn test_reqwest_client_default() {
        let _client = ReqwestClient::default();
    }

    #[test]
    fn test_reqwest_client_with_settings() {
        let _client = ReqwestClient::with_settings("test-agent", Duration::from_secs(1));
    }

    #[test]
    fn test_reqwest_client_with_client() {
        let client = Client::builder()
            .user_agent("test-agent")
            .build()
            .unwrap();
        let _client = ReqwestClient::with_client(client);
    }

    #[tokio::test]
    async fn test_reqwest_client_unreachable_host() {
        let client = ReqwestClient::with_settings("test-agent", Duration::from_millis(500));
        let result = client.fetch("http://127.0.0.1:9/").await;
        assert!(matches!(result, Err(ProxyFetcherError::Http(_))));
    }
}
