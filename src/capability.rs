//! Capability contracts for plugin roles.
//!
//! Every plugin trait in this crate is checked by the compiler, but plugins
//! assembled at runtime (see [`crate::plugin::DynamicPlugin`]) can only describe
//! the operations they export. [`check`] compares such a description against the
//! operation set a [`Role`] requires. It is a shape check only: names and
//! accepted argument counts, never behaviour.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ProxyFetcherError, Result};

/// Plugin roles recognised by the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Fetches listing pages.
    HttpClient,
    /// Decides whether a proxy is connectable.
    Validator,
    /// Turns raw markup into a queryable document.
    DocumentAdapter,
    /// Supplies listing URLs and extracts proxy records.
    Provider,
}

impl Role {
    /// All roles, in a fixed order.
    pub const ALL: [Role; 4] = [
        Role::HttpClient,
        Role::Validator,
        Role::DocumentAdapter,
        Role::Provider,
    ];

    /// Operations (name, argument count) a plugin must export for this role.
    pub fn required_operations(&self) -> &'static [(&'static str, usize)] {
        match self {
            Role::HttpClient => &[("fetch", 1)],
            Role::Validator => &[("connectable", 2)],
            Role::DocumentAdapter => &[("install_requirements", 0), ("parse", 1)],
            Role::Provider => &[("listing_urls", 0), ("extract", 1)],
        }
    }

    /// The complete capability set of this role.
    ///
    /// Statically typed plugins report this from their `capabilities()` method.
    pub fn capabilities(&self) -> Capabilities {
        self.required_operations()
            .iter()
            .fold(Capabilities::new(), |caps, (name, arity)| {
                caps.with(*name, Arity::Exact(*arity))
            })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::HttpClient => "http client",
            Role::Validator => "validator",
            Role::DocumentAdapter => "document adapter",
            Role::Provider => "provider",
        };
        f.write_str(name)
    }
}

/// Number of arguments an exported operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Exactly this many arguments.
    Exact(usize),
    /// This many or more (variadic tail).
    AtLeast(usize),
    /// Between `min` and `max` inclusive (optional arguments).
    Between(usize, usize),
}

impl Arity {
    /// Returns whether a call with `count` arguments is acceptable.
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => n == count,
            Arity::AtLeast(min) => count >= min,
            Arity::Between(min, max) => min <= count && count <= max,
        }
    }
}

/// Set of operations a plugin exports, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    operations: BTreeMap<String, Arity>,
}

impl Capabilities {
    /// Creates an empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exported operation.
    pub fn with(mut self, name: impl Into<String>, arity: Arity) -> Self {
        self.insert(name, arity);
        self
    }

    /// Adds or replaces an exported operation.
    pub fn insert(&mut self, name: impl Into<String>, arity: Arity) {
        self.operations.insert(name.into(), arity);
    }

    /// Returns the arity of an exported operation.
    pub fn arity(&self, name: &str) -> Option<Arity> {
        self.operations.get(name).copied()
    }

    /// Returns whether no operations are exported.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterates over exported operation names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }
}

/// Required operations of `role` that `capabilities` does not satisfy.
pub fn missing_operations(role: Role, capabilities: &Capabilities) -> Vec<String> {
    role.required_operations()
        .iter()
        .filter(|(name, count)| {
            !capabilities
                .arity(name)
                .is_some_and(|arity| arity.accepts(*count))
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Checks that `capabilities` satisfies every operation `role` requires.
pub fn check(role: Role, capabilities: &Capabilities) -> Result<()> {
    let missing = missing_operations(role, capabilities);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ProxyFetcherError::WrongCapability { role, missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities_pass_own_check() {
        for role in Role::ALL {
            check(role, &role.capabilities()).unwrap();
        }
    }

    #[test]
    fn test_empty_capabilities_fail_every_role() {
        for role in Role::ALL {
            let err = check(role, &Capabilities::new()).unwrap_err();
            match err {
                ProxyFetcherError::WrongCapability { role: r, missing } => {
                    assert_eq!(r, role);
                    assert_eq!(missing.len(), role.required_operations().len());
                }
                other => panic!("Expected WrongCapability, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_extra_operations_are_ignored() {
        let caps = Capabilities::new()
            .with("fetch", Arity::Exact(1))
            .with("close", Arity::Exact(0))
            .with("stats", Arity::AtLeast(0));
        check(Role::HttpClient, &caps).unwrap();
    }

    #[test]
    fn test_wrong_arity_is_reported_missing() {
        let caps = Capabilities::new().with("fetch", Arity::Exact(2));
        let missing = missing_operations(Role::HttpClient, &caps);
        assert_eq!(missing, vec!["fetch".to_string()]);
    }

    #[test]
    fn test_variadic_validator_is_accepted() {
        let caps = Capabilities::new().with("connectable", Arity::AtLeast(0));
        check(Role::Validator, &caps).unwrap();
    }

    #[test]
    fn test_optional_arguments_are_accepted() {
        let caps = Capabilities::new().with("connectable", Arity::Between(1, 3));
        check(Role::Validator, &caps).unwrap();

        let too_narrow = Capabilities::new().with("connectable", Arity::Between(0, 1));
        assert!(check(Role::Validator, &too_narrow).is_err());
    }

    #[test]
    fn test_partial_adapter_reports_only_missing() {
        let caps = Capabilities::new().with("parse", Arity::Exact(1));
        let missing = missing_operations(Role::DocumentAdapter, &caps);
        assert_eq!(missing, vec!["install_requirements".to_string()]);
    }

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::Exact(1).accepts(1));
        assert!(!Arity::Exact(1).accepts(0));
        assert!(Arity::AtLeast(1).accepts(5));
        assert!(!Arity::AtLeast(1).accepts(0));
        assert!(Arity::Between(0, 2).accepts(2));
        assert!(!Arity::Between(0, 2).accepts(3));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::HttpClient.to_string(), "http client");
        assert_eq!(Role::DocumentAdapter.to_string(), "document adapter");
    }

    #[test]
    fn test_capabilities_deserialization() {
        let json = r#"{"operations":{"fetch":{"exact":1},"head":{"at_least":1}}}"#;
        let caps: Capabilities = serde_json::from_str(json).unwrap();
        assert_eq!(caps.arity("fetch"), Some(Arity::Exact(1)));
        assert_eq!(caps.arity("head"), Some(Arity::AtLeast(1)));
        check(Role::HttpClient, &caps).unwrap();
    }
}
