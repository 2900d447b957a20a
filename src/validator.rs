//! Proxy connectivity validators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy as ReqwestProxy};
use tracing::debug;

use crate::capability::{Capabilities, Role};
use crate::client_http::DEFAULT_USER_AGENT;
use crate::{ProxyFetcherError, ProxyRecord, Result};

/// Default per-probe deadline.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// URL requested through a candidate proxy by [`ReqwestValidator`].
pub const DEFAULT_CHECK_URL: &str = "https://www.google.com";

/// Options passed to every probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Deadline for this probe.
    pub timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Decides whether a proxy endpoint is reachable and usable.
///
/// `Ok(false)` means "not connectable"; an `Err` is a probe error. Both exclude
/// the proxy from a validated list and neither fails the overall operation.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Probes a single proxy.
    async fn connectable(&self, proxy: &ProxyRecord, options: &ProbeOptions) -> Result<bool>;

    /// Operations this validator exports.
    fn capabilities(&self) -> Capabilities {
        Role::Validator.capabilities()
    }
}

/// Validator that sends a HEAD request to a check URL through the proxy.
///
/// Any HTTP response counts as connectable: the proxy relayed the request,
/// whatever the target answered.
#[derive(Debug, Clone)]
pub struct ReqwestValidator {
    check_url: String,
    user_agent: String,
}

impl ReqwestValidator {
    /// Creates a validator checking against [`DEFAULT_CHECK_URL`].
    pub fn new() -> Self {
        Self {
            check_url: DEFAULT_CHECK_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Sets the URL requested through each proxy.
    pub fn with_check_url(mut self, url: impl Into<String>) -> Self {
        self.check_url = url.into();
        self
    }

    /// Sets the user agent sent through each proxy.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the check URL.
    pub fn check_url(&self) -> &str {
        &self.check_url
    }

    fn create_client(&self, proxy: &ProxyRecord, timeout: Duration) -> Result<Client> {
        let proxy = ReqwestProxy::all(proxy.url())
            .map_err(|e| ProxyFetcherError::Probe(format!("Failed to create proxy: {}", e)))?;

        Client::builder()
            .proxy(proxy)
            .user_agent(&self.user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyFetcherError::Probe(format!("Failed to create HTTP client: {}", e)))
    }
}

impl Default for ReqwestValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for ReqwestValidator {
    async fn connectable(&self, proxy: &ProxyRecord, options: &ProbeOptions) -> Result<bool> {
        let client = self.create_client(proxy, options.timeout)?;
        match client.head(&self.check_url).send().await {
            Ok(response) => {
                debug!("{} answered {}", proxy.addr(), response.status());
                Ok(true)
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                debug!("{} not connectable: {}", proxy.addr(), e);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
