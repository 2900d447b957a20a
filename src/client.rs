//! HTTP client abstraction for retrieving provider listings.

use async_trait::async_trait;

use crate::capability::{Capabilities, Role};
use crate::Result;

/// Trait for fetching the body of a listing URL.
///
/// All configuration (user-agent, timeouts) is set at construction time;
/// `fetch` is a simple URL-in, body-out interface.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetches the body of the given URL.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Operations this client exports.
    fn capabilities(&self) -> Capabilities {
        Role::HttpClient.capabilities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::check;
    use crate::ProxyFetcherError;

    struct EchoClient;

    #[async_trait]
    impl HttpClient for EchoClient {
        async fn fetch(&self, url: &str) -> Result<String> {
            Ok(url.to_string())
        }
    }

    struct FailingClient;

    #[async_trait]
    impl HttpClient for FailingClient {
        async fn fetch(&self, url: &str) -> Result<String> {
            Err(ProxyFetcherError::Status {
                url: url.to_string(),
                status: 503,
            })
        }
    }

    #[tokio::test]
    async fn test_echo_client_fetch() {
        let body = EchoClient.fetch("https://example.com").await.unwrap();
        assert_eq!(body, "https://example.com");
    }

    #[tokio::test]
    async fn test_failing_client_fetch() {
        let err = FailingClient.fetch("https://example.com").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503 for https://example.com");
    }

    #[test]
    fn test_default_capabilities_satisfy_role() {
        check(Role::HttpClient, &EchoClient.capabilities()).unwrap();
    }
}
