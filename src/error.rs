//! Error types for the proxy fetcher library.

use thiserror::Error;

use crate::capability::Role;

/// Result type alias for proxy fetcher operations.
pub type Result<T> = std::result::Result<T, ProxyFetcherError>;

/// Errors that can occur while configuring plugins or fetching proxy lists.
///
/// Probe failures are intentionally absent: a proxy that cannot be reached is
/// reported as a rejected probe outcome, never as an error.
#[derive(Error, Debug)]
pub enum ProxyFetcherError {
    /// A plugin does not export the operations its role requires.
    #[error("{role} plugin is missing required operations: {}", missing.join(", "))]
    WrongCapability {
        /// Role the plugin was assigned to.
        role: Role,
        /// Required operations that were absent or had an incompatible arity.
        missing: Vec<String>,
    },

    /// A document adapter failed to install its runtime requirements.
    #[error("Document adapter '{adapter}' setup failed: {reason}")]
    AdapterSetup {
        /// Adapter name.
        adapter: String,
        /// Why the requirements could not be installed.
        reason: String,
    },

    /// A provider with this name is already registered.
    #[error("Provider '{0}' is already registered")]
    AlreadyRegistered(String),

    /// No provider is registered under this name.
    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    /// A provider name is not a plain identifier.
    #[error("Invalid provider name '{0}'")]
    InvalidProviderName(String),

    /// A tunable was given an unusable value.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// Retrieving or parsing a provider listing failed.
    #[error("Failed to fetch proxies from '{provider}': {source}")]
    Fetch {
        /// Provider whose listing failed.
        provider: String,
        /// Underlying cause.
        #[source]
        source: Box<ProxyFetcherError>,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request returned a non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// Failed to parse a listing document.
    #[error("Failed to parse document: {0}")]
    Parse(String),

    /// A validator could not complete a probe.
    #[error("Probe failed: {0}")]
    Probe(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl From<::config::ConfigError> for ProxyFetcherError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::InvalidSetting(err.to_string())
    }
}

impl ProxyFetcherError {
    /// Wraps an error as a fetch failure for the given provider.
    ///
    /// Errors that already are fetch failures are returned unchanged.
    pub fn fetch(provider: impl Into<String>, source: ProxyFetcherError) -> Self {
        match source {
            err @ Self::Fetch { .. } => err,
            other => Self::Fetch {
                provider: provider.into(),
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_wrong_capability() {
        let err = ProxyFetcherError::WrongCapability {
            role: Role::Validator,
            missing: vec!["connectable".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "validator plugin is missing required operations: connectable"
        );
    }

    #[test]
    fn test_error_display_wrong_capability_multiple() {
        let err = ProxyFetcherError::WrongCapability {
            role: Role::Provider,
            missing: vec!["listing_urls".to_string(), "extract".to_string()],
        };
        assert!(err.to_string().ends_with("listing_urls, extract"));
    }

    #[test]
    fn test_error_display_adapter_setup() {
        let err = ProxyFetcherError::AdapterSetup {
            adapter: "scraper".to_string(),
            reason: "feature disabled".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Document adapter 'scraper' setup failed: feature disabled"
        );
    }

    #[test]
    fn test_error_display_registry() {
        assert_eq!(
            ProxyFetcherError::AlreadyRegistered("xroxy".to_string()).to_string(),
            "Provider 'xroxy' is already registered"
        );
        assert_eq!(
            ProxyFetcherError::UnknownProvider("nope".to_string()).to_string(),
            "Unknown provider 'nope'"
        );
    }

    #[test]
    fn test_fetch_wraps_cause() {
        let err = ProxyFetcherError::fetch("xroxy", ProxyFetcherError::Parse("bad".to_string()));
        assert_eq!(
            err.to_string(),
            "Failed to fetch proxies from 'xroxy': Failed to parse document: bad"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_fetch_does_not_double_wrap() {
        let inner = ProxyFetcherError::fetch("a", ProxyFetcherError::Other("x".to_string()));
        let outer = ProxyFetcherError::fetch("b", inner);
        match outer {
            ProxyFetcherError::Fetch { provider, .. } => assert_eq!(provider, "a"),
            other => panic!("Expected Fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_config_error_converts_to_invalid_setting() {
        let err: ProxyFetcherError = ::config::ConfigError::Message("bad value".to_string()).into();
        assert!(matches!(err, ProxyFetcherError::InvalidSetting(_)));
    }
}
