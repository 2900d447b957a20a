//! Proxy list manager.

use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::pipeline::Fetcher;
use crate::validation::{ProbeReport, ValidationEngine, ValidationOptions};
use crate::{Provider, ProxyRecord, Result};

/// Fetches and validates proxy lists from the configured provider.
///
/// The provider is resolved when the manager is built. HTTP client, adapter,
/// validator and tunables are read from the context on every call, so a
/// manager follows later configuration changes.
pub struct Manager {
    context: Arc<Context>,
    provider_name: String,
    provider: Arc<dyn Provider>,
}

impl Manager {
    /// Creates a manager bound to the process-wide context.
    ///
    /// Fails with `UnknownProvider` if the configured provider is not
    /// registered. No network request is made.
    pub fn new() -> Result<Self> {
        Self::with_context(Context::global())
    }

    /// Creates a manager bound to the given context.
    pub fn with_context(context: Arc<Context>) -> Result<Self> {
        let provider_name = context.configuration().provider();
        let provider = context.registry().lookup(&provider_name)?;
        debug!("Manager bound to provider '{}'", provider_name);
        Ok(Self {
            context,
            provider_name,
            provider,
        })
    }

    /// Registry name of the bound provider.
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// The provider resolved when the manager was built.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// The context the manager reads its configuration from.
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Fetches the provider's listing once.
    ///
    /// Errors are returned as `Fetch`, wrapping the underlying cause. Nothing
    /// is retried.
    pub async fn fetch_proxies(&self) -> Result<Vec<ProxyRecord>> {
        let config = self.context.configuration().snapshot();
        Fetcher::new(Arc::clone(&self.provider), config.http_client, config.adapter)
            .fetch()
            .await
    }

    /// Fetches the listing and returns only the proxies that pass validation.
    pub async fn validated_proxies(
        &self,
        options: Option<ValidationOptions>,
    ) -> Result<Vec<ProxyRecord>> {
        let proxies = self.fetch_proxies().await?;
        Ok(self.validate(proxies, options).await)
    }

    /// Validates caller-supplied proxies with the configured validator.
    pub async fn validate(
        &self,
        proxies: Vec<ProxyRecord>,
        options: Option<ValidationOptions>,
    ) -> Vec<ProxyRecord> {
        self.engine(options).validate(proxies).await
    }

    /// Probes caller-supplied proxies and reports every outcome.
    pub async fn probe(
        &self,
        proxies: Vec<ProxyRecord>,
        options: Option<ValidationOptions>,
    ) -> Vec<ProbeReport> {
        self.engine(options).probe_all(proxies).await
    }

    fn engine(&self, options: Option<ValidationOptions>) -> ValidationEngine {
        let config = self.context.configuration().snapshot();
        ValidationEngine::from_config(&config).with_options(&options.unwrap_or_default())
    }
}
