//! Shared configuration and provider registry.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::config::Configuration;
use crate::registry::ProviderRegistry;
use crate::{Provider, Result};

static GLOBAL: Lazy<Arc<Context>> = Lazy::new(|| Arc::new(Context::new()));

/// Configuration and provider registry used by managers.
///
/// Managers built from the same context observe the same active plugins.
/// [`Context::global`] is the process-wide default; tests and embedders
/// that want isolation create their own.
#[derive(Debug)]
pub struct Context {
    configuration: Configuration,
    registry: ProviderRegistry,
}

impl Context {
    /// Creates a context with default configuration and the built-in providers.
    pub fn new() -> Self {
        Self::with_parts(Configuration::new(), ProviderRegistry::with_builtin())
    }

    /// Creates a context from an existing configuration and registry.
    pub fn with_parts(configuration: Configuration, registry: ProviderRegistry) -> Self {
        Self {
            configuration,
            registry,
        }
    }

    /// Process-wide default context.
    pub fn global() -> Arc<Context> {
        Arc::clone(&GLOBAL)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Registers a provider under its own name.
    pub fn register_provider(&self, provider: Arc<dyn Provider>) -> Result<()> {
        let name = provider.name().to_string();
        self.registry.register(&name, provider)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::providers::{Xroxy, DEFAULT_PROVIDER};
    use crate::{ProxyFetcherError, ProxyRecord};

    struct Custom;

    impl Provider for Custom {
        fn name(&self) -> &str {
            "custom"
        }

        fn listing_urls(&self) -> Vec<String> {
            Vec::new()
        }

        fn extract(&self, _document: &Document) -> Result<Vec<ProxyRecord>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_context_new() {
        let ctx = Context::new();
        assert_eq!(ctx.configuration().provider(), DEFAULT_PROVIDER);
        assert!(ctx.registry().contains(DEFAULT_PROVIDER));
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = Context::new();
        let b = Context::new();
        a.configuration().set_provider("xroxy").unwrap();
        a.register_provider(Arc::new(Custom)).unwrap();
        assert_eq!(b.configuration().provider(), DEFAULT_PROVIDER);
        assert!(!b.registry().contains("custom"));
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&Context::global(), &Context::global()));
    }

    #[test]
    fn test_register_builtin_provider_again_fails() {
        let ctx = Context::new();
        let err = ctx.register_provider(Arc::new(Xroxy::new())).unwrap_err();
        assert!(matches!(err, ProxyFetcherError::AlreadyRegistered(name) if name == "xroxy"));
    }
}
