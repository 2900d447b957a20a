//! Provider registry.
//!
//! Lookups load an immutable snapshot of the name map without locking.
//! Registrations are serialized by a writer lock: each copies the current
//! map, inserts, and publishes the new snapshot, so none is ever lost.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tracing::debug;

use crate::capability::{self, Role};
use crate::providers;
use crate::{Provider, ProxyFetcherError, Result};

type ProviderMap = HashMap<String, Arc<dyn Provider>>;

/// Mapping from provider name to implementation.
pub struct ProviderRegistry {
    providers: ArcSwap<ProviderMap>,
    writer: Mutex<()>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::from_map(HashMap::new())
    }

    /// Creates a registry holding the built-in providers.
    pub fn with_builtin() -> Self {
        let map = providers::builtin()
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();
        Self::from_map(map)
    }

    fn from_map(map: ProviderMap) -> Self {
        Self {
            providers: ArcSwap::from_pointee(map),
            writer: Mutex::new(()),
        }
    }

    /// Registers a provider under `name`.
    ///
    /// Fails with `AlreadyRegistered` if the name is taken.
    pub fn register(&self, name: &str, provider: Arc<dyn Provider>) -> Result<()> {
        self.insert(name, provider, false)
    }

    /// Registers a provider, replacing any provider with the same name.
    pub fn register_forced(&self, name: &str, provider: Arc<dyn Provider>) -> Result<()> {
        self.insert(name, provider, true)
    }

    fn insert(&self, name: &str, provider: Arc<dyn Provider>, force: bool) -> Result<()> {
        validate_name(name)?;
        capability::check(Role::Provider, &provider.capabilities())?;

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.providers.load_full();
        if !force && current.contains_key(name) {
            return Err(ProxyFetcherError::AlreadyRegistered(name.to_string()));
        }

        let mut next = ProviderMap::clone(&current);
        next.insert(name.to_string(), provider);
        self.providers.store(Arc::new(next));
        debug!("Registered provider '{}'", name);
        Ok(())
    }

    /// Looks up a provider by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Provider>> {
        self.snapshot()
            .get(name)
            .cloned()
            .ok_or_else(|| ProxyFetcherError::UnknownProvider(name.to_string()))
    }

    /// Returns whether a provider is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.snapshot().contains_key(name)
    }

    /// Names of all registered providers.
    pub fn names(&self) -> BTreeSet<String> {
        self.snapshot().keys().cloned().collect()
    }

    /// Returns the number of registered providers.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn snapshot(&self) -> Arc<ProviderMap> {
        self.providers.load_full()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Checks that `name` is a plain provider name: ASCII letters, digits, `_` or `-`.
pub fn validate_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        Ok(())
    } else {
        Err(ProxyFetcherError::InvalidProviderName(name.to_string()))
    }
}
