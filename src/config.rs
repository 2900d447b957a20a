//! Runtime configuration of the active plugins and tunables.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::capability::{self, Role};
use crate::client::HttpClient;
use crate::client_http::{ReqwestClient, DEFAULT_CLIENT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::document::DocumentAdapter;
use crate::providers::DEFAULT_PROVIDER;
use crate::registry;
use crate::validator::{ReqwestValidator, Validator, DEFAULT_CHECK_URL, DEFAULT_PROBE_TIMEOUT};
use crate::{ProxyFetcherError, Result};

/// Default number of probes in flight at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Prefix of environment variables read by [`Settings::load`].
pub const ENV_PREFIX: &str = "PROXY_FETCHER";

/// Adapter used when none is configured.
pub fn default_adapter() -> Arc<dyn DocumentAdapter> {
    #[cfg(feature = "scraper-adapter")]
    {
        Arc::new(crate::html::ScraperAdapter::new())
    }
    #[cfg(not(feature = "scraper-adapter"))]
    {
        Arc::new(crate::document::LineAdapter::new())
    }
}

/// A consistent copy of every configuration field.
#[derive(Clone)]
pub struct ConfigSnapshot {
    /// Client that downloads listing pages.
    pub http_client: Arc<dyn HttpClient>,
    /// Validator that probes candidate proxies.
    pub validator: Arc<dyn Validator>,
    /// Name of the provider to fetch from.
    pub provider: String,
    /// Adapter that parses listing pages.
    pub adapter: Arc<dyn DocumentAdapter>,
    /// Per-probe deadline.
    pub timeout: Duration,
    /// Listing page request timeout of the built-in HTTP client.
    pub client_timeout: Duration,
    /// Probes in flight at once.
    pub max_concurrency: usize,
    /// User agent of the built-in client and validator.
    pub user_agent: String,
}

impl ConfigSnapshot {
    fn defaults() -> Self {
        Self {
            http_client: Arc::new(ReqwestClient::new()),
            validator: Arc::new(ReqwestValidator::new()),
            provider: DEFAULT_PROVIDER.to_string(),
            adapter: default_adapter(),
            timeout: DEFAULT_PROBE_TIMEOUT,
            client_timeout: DEFAULT_CLIENT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl fmt::Debug for ConfigSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSnapshot")
            .field("provider", &self.provider)
            .field("adapter", &self.adapter.name())
            .field("timeout", &self.timeout)
            .field("client_timeout", &self.client_timeout)
            .field("max_concurrency", &self.max_concurrency)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

struct State {
    current: ConfigSnapshot,
    // Built-in plugins are rebuilt when the user agent or client timeout
    // changes; assigned ones are left alone.
    custom_client: bool,
    custom_validator: bool,
    check_url: String,
}

impl State {
    fn defaults() -> Self {
        Self {
            current: ConfigSnapshot::defaults(),
            custom_client: false,
            custom_validator: false,
            check_url: DEFAULT_CHECK_URL.to_string(),
        }
    }

    fn rebuild_builtins(&mut self) {
        if !self.custom_client {
            self.current.http_client = Arc::new(ReqwestClient::with_settings(
                &self.current.user_agent,
                self.current.client_timeout,
            ));
        }
        if !self.custom_validator {
            self.current.validator = Arc::new(
                ReqwestValidator::new()
                    .with_check_url(self.check_url.clone())
                    .with_user_agent(self.current.user_agent.clone()),
            );
        }
    }
}

/// Active plugins and tunables.
///
/// Every setter validates its input before taking the mutation lock, so a
/// failed assignment never changes the stored value.
pub struct Configuration {
    state: RwLock<State>,
}

impl Configuration {
    /// Creates a configuration holding the built-in defaults.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::defaults()),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&ConfigSnapshot) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state.current)
    }

    /// Returns a consistent copy of all fields.
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.read(ConfigSnapshot::clone)
    }

    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        self.read(|c| Arc::clone(&c.http_client))
    }

    /// Assigns the HTTP client used to fetch listing pages.
    pub fn set_http_client(&self, client: Arc<dyn HttpClient>) -> Result<()> {
        capability::check(Role::HttpClient, &client.capabilities())?;
        let mut state = self.write();
        state.current.http_client = client;
        state.custom_client = true;
        Ok(())
    }

    pub fn validator(&self) -> Arc<dyn Validator> {
        self.read(|c| Arc::clone(&c.validator))
    }

    /// Assigns the validator used to probe proxies.
    pub fn set_validator(&self, validator: Arc<dyn Validator>) -> Result<()> {
        capability::check(Role::Validator, &validator.capabilities())?;
        let mut state = self.write();
        state.current.validator = validator;
        state.custom_validator = true;
        Ok(())
    }

    pub fn adapter(&self) -> Arc<dyn DocumentAdapter> {
        self.read(|c| Arc::clone(&c.adapter))
    }

    /// Assigns the document adapter, installing its requirements first.
    ///
    /// A failing `install_requirements` is reported as
    /// [`ProxyFetcherError::AdapterSetup`] and the previous adapter stays active.
    pub fn set_adapter(&self, adapter: Arc<dyn DocumentAdapter>) -> Result<()> {
        capability::check(Role::DocumentAdapter, &adapter.capabilities())?;
        adapter.install_requirements().map_err(|e| match e {
            err @ ProxyFetcherError::AdapterSetup { .. } => err,
            other => ProxyFetcherError::AdapterSetup {
                adapter: adapter.name().to_string(),
                reason: other.to_string(),
            },
        })?;
        debug!("Document adapter '{}' installed", adapter.name());
        self.write().current.adapter = adapter;
        Ok(())
    }

    /// Name of the configured provider.
    pub fn provider(&self) -> String {
        self.read(|c| c.provider.clone())
    }

    /// Sets the provider name.
    ///
    /// Only the shape of the name is checked here; whether a provider with this
    /// name exists is decided when a manager is built.
    pub fn set_provider(&self, name: &str) -> Result<()> {
        registry::validate_name(name)?;
        self.write().current.provider = name.to_string();
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        self.read(|c| c.timeout)
    }

    /// Sets the per-probe deadline.
    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        non_zero_duration("timeout", timeout)?;
        self.write().current.timeout = timeout;
        Ok(())
    }

    pub fn client_timeout(&self) -> Duration {
        self.read(|c| c.client_timeout)
    }

    /// Sets the request timeout of the built-in HTTP client.
    pub fn set_client_timeout(&self, timeout: Duration) -> Result<()> {
        non_zero_duration("client_timeout", timeout)?;
        let mut state = self.write();
        state.current.client_timeout = timeout;
        state.rebuild_builtins();
        Ok(())
    }

    pub fn max_concurrency(&self) -> usize {
        self.read(|c| c.max_concurrency)
    }

    /// Sets how many probes may be in flight at once.
    pub fn set_max_concurrency(&self, max_concurrency: usize) -> Result<()> {
        if max_concurrency == 0 {
            return Err(ProxyFetcherError::InvalidSetting(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        self.write().current.max_concurrency = max_concurrency;
        Ok(())
    }

    pub fn user_agent(&self) -> String {
        self.read(|c| c.user_agent.clone())
    }

    /// Sets the user agent of the built-in HTTP client and validator.
    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        let mut state = self.write();
        state.current.user_agent = user_agent.into();
        state.rebuild_builtins();
    }

    /// Restores every field to the built-in defaults.
    pub fn reset(&self) {
        *self.write() = State::defaults();
        debug!("Configuration reset to defaults");
    }

    /// Applies loaded settings.
    ///
    /// All values are validated before anything is changed. Built-in HTTP
    /// client and validator are rebuilt from the new values; assigned ones
    /// are kept.
    pub fn apply(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;

        let mut state = self.write();
        state.current.provider = settings.provider.clone();
        state.current.timeout = settings.timeout();
        state.current.client_timeout = settings.client_timeout();
        state.current.max_concurrency = settings.max_concurrency;
        state.current.user_agent = settings.user_agent.clone();
        state.check_url = settings.check_url.clone();
        state.rebuild_builtins();
        info!(
            "Applied settings: provider={}, timeout={:?}, max_concurrency={}",
            settings.provider,
            settings.timeout(),
            settings.max_concurrency
        );
        Ok(())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Configuration").field(&self.snapshot()).finish()
    }
}

fn non_zero_duration(field: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        Err(ProxyFetcherError::InvalidSetting(format!(
            "{} must be greater than zero",
            field
        )))
    } else {
        Ok(())
    }
}

/// Tunables loaded from a settings file and the environment.
///
/// Environment variables use the `PROXY_FETCHER_` prefix, e.g.
/// `PROXY_FETCHER_MAX_CONCURRENCY=20`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: String,
    pub timeout_ms: u64,
    pub client_timeout_ms: u64,
    pub max_concurrency: usize,
    pub user_agent: String,
    /// URL requested through each proxy by the built-in validator.
    pub check_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
            client_timeout_ms: DEFAULT_CLIENT_TIMEOUT.as_millis() as u64,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            check_url: DEFAULT_CHECK_URL.to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from an optional file, then `PROXY_FETCHER_*` variables.
    ///
    /// The file format (TOML, YAML, JSON) follows its extension.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings: Settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client_timeout_ms)
    }

    /// Checks every value without applying anything.
    pub fn validate(&self) -> Result<()> {
        registry::validate_name(&self.provider)?;
        non_zero_duration("timeout", self.timeout())?;
        non_zero_duration("client_timeout", self.client_timeout())?;
        if self.max_concurrency == 0 {
            return Err(ProxyFetcherError::InvalidSetting(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.check_url).map_err(|e| {
            ProxyFetcherError::InvalidSetting(format!("check_url '{}': {}", self.check_url, e))
        })?;
        Ok(())
    }
}
