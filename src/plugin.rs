//! Late-bound plugins assembled at runtime.
//!
//! A [`DynamicPlugin`] is a named set of operations, each with a declared
//! [`Arity`] and a handler over JSON values. It reports exactly the operations
//! it was given, so assigning it to a role runs the usual capability check
//! against what it really exports.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};

use crate::capability::{Arity, Capabilities};
use crate::client::HttpClient;
use crate::validator::{ProbeOptions, Validator};
use crate::{ProxyFetcherError, ProxyRecord, Result};

/// Handler of one plugin operation.
pub type Handler = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

#[derive(Clone)]
struct Operation {
    arity: Arity,
    handler: Handler,
}

/// A plugin whose operations are registered at runtime.
#[derive(Clone)]
pub struct DynamicPlugin {
    name: String,
    operations: BTreeMap<String, Operation>,
}

impl DynamicPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: BTreeMap::new(),
        }
    }

    /// Adds an operation.
    pub fn operation<F, Fut>(mut self, name: impl Into<String>, arity: Arity, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |args: Vec<Value>| handler(args).boxed());
        self.operations
            .insert(name.into(), Operation { arity, handler });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operations this plugin exports.
    pub fn capabilities(&self) -> Capabilities {
        self.operations
            .iter()
            .fold(Capabilities::new(), |caps, (name, op)| caps.with(name.as_str(), op.arity))
    }

    /// Invokes an operation.
    pub async fn call(&self, operation: &str, args: Vec<Value>) -> Result<Value> {
        let op = self.operations.get(operation).ok_or_else(|| {
            ProxyFetcherError::Other(format!(
                "Plugin '{}' has no operation '{}'",
                self.name, operation
            ))
        })?;
        if !op.arity.accepts(args.len()) {
            return Err(ProxyFetcherError::Other(format!(
                "Plugin '{}': '{}' does not accept {} argument(s)",
                self.name,
                operation,
                args.len()
            )));
        }
        (op.handler)(args).await
    }

    /// Uses this plugin as an HTTP client (`fetch(url) -> string`).
    pub fn into_http_client(self) -> DynamicHttpClient {
        DynamicHttpClient(self)
    }

    /// Uses this plugin as a validator (`connectable(proxy, options) -> bool`).
    ///
    /// The proxy is passed as its serialized record, the options as
    /// `{"timeout_ms": n}`.
    pub fn into_validator(self) -> DynamicValidator {
        DynamicValidator(self)
    }
}

impl fmt::Debug for DynamicPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicPlugin")
            .field("name", &self.name)
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// [`DynamicPlugin`] in the HTTP client role.
#[derive(Debug, Clone)]
pub struct DynamicHttpClient(DynamicPlugin);

#[async_trait]
impl HttpClient for DynamicHttpClient {
    async fn fetch(&self, url: &str) -> Result<String> {
        match self.0.call("fetch", vec![Value::from(url)]).await? {
            Value::String(body) => Ok(body),
            other => Err(ProxyFetcherError::Other(format!(
                "Plugin '{}': fetch returned {} instead of a string",
                self.0.name(),
                other
            ))),
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.0.capabilities()
    }
}

/// [`DynamicPlugin`] in the validator role.
#[derive(Debug, Clone)]
pub struct DynamicValidator(DynamicPlugin);

#[async_trait]
impl Validator for DynamicValidator {
    async fn connectable(&self, proxy: &ProxyRecord, options: &ProbeOptions) -> Result<bool> {
        let proxy = serde_json::to_value(proxy).map_err(|e| ProxyFetcherError::Other(e.to_string()))?;
        let options = json!({ "timeout_ms": options.timeout.as_millis() as u64 });
        match self.0.call("connectable", vec![proxy, options]).await? {
            Value::Bool(connectable) => Ok(connectable),
            other => Err(ProxyFetcherError::Probe(format!(
                "Plugin '{}': connectable returned {} instead of a boolean",
                self.0.name(),
                other
            ))),
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.0.capabilities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Role;
    use crate::config::Configuration;
    use tokio_test::{assert_err, assert_ok};

    fn fetching_plugin() -> DynamicPlugin {
        DynamicPlugin::new("custom_client").operation("fetch", Arity::Exact(1), |args| async move {
            let url = args[0].as_str().unwrap_or_default().to_string();
            Ok(Value::String(format!("body of {}", url)))
        })
    }

    #[tokio::test]
    async fn test_dynamic_http_client_fetch() {
        let client = fetching_plugin().into_http_client();
        assert_eq!(
            client.fetch("https://example.com").await.unwrap(),
            "body of https://example.com"
        );
    }

    #[test]
    fn test_assign_dynamic_http_client() {
        let config = Configuration::new();
        assert_ok!(config.set_http_client(Arc::new(fetching_plugin().into_http_client())));
    }

    #[test]
    fn test_assign_plugin_without_fetch_fails() {
        let config = Configuration::new();
        let previous = config.http_client();
        let plugin = DynamicPlugin::new("wrong").operation("get", Arity::Exact(1), |_| async {
            Ok(Value::Null)
        });

        let err = config
            .set_http_client(Arc::new(plugin.into_http_client()))
            .unwrap_err();
        match err {
            ProxyFetcherError::WrongCapability { role, missing } => {
                assert_eq!(role, Role::HttpClient);
                assert_eq!(missing, vec!["fetch".to_string()]);
            }
            other => panic!("Expected WrongCapability, got {:?}", other),
        }
        assert!(Arc::ptr_eq(&config.http_client(), &previous));
    }

    #[test]
    fn test_assign_plugin_with_wrong_arity_fails() {
        let config = Configuration::new();
        let plugin = DynamicPlugin::new("wrong").operation("fetch", Arity::Exact(2), |_| async {
            Ok(Value::Null)
        });
        assert!(config
            .set_http_client(Arc::new(plugin.into_http_client()))
            .is_err());
    }

    #[test]
    fn test_assign_validator_without_connectable_fails() {
        let config = Configuration::new();
        let plugin = DynamicPlugin::new("wrong").operation("check", Arity::AtLeast(1), |_| async {
            Ok(Value::Bool(true))
        });
        assert!(matches!(
            config.set_validator(Arc::new(plugin.into_validator())),
            Err(ProxyFetcherError::WrongCapability {
                role: Role::Validator,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_dynamic_validator_with_permissive_arity() {
        let plugin = DynamicPlugin::new("port_checker").operation(
            "connectable",
            Arity::AtLeast(1),
            |args| async move { Ok(Value::Bool(args[0]["port"] == 3128)) },
        );
        let validator = plugin.into_validator();

        let config = Configuration::new();
        config.set_validator(Arc::new(validator.clone())).unwrap();

        let options = ProbeOptions::default();
        let good = ProxyRecord::new("10.0.0.1", 3128).unwrap();
        let bad = ProxyRecord::new("10.0.0.1", 80).unwrap();
        assert!(validator.connectable(&good, &options).await.unwrap());
        assert!(!validator.connectable(&bad, &options).await.unwrap());
    }

    #[tokio::test]
    async fn test_dynamic_validator_non_boolean_is_probe_error() {
        let validator = DynamicPlugin::new("odd")
            .operation("connectable", Arity::Exact(2), |_| async { Ok(json!("yes")) })
            .into_validator();
        let proxy = ProxyRecord::new("10.0.0.1", 80).unwrap();
        assert!(matches!(
            validator.connectable(&proxy, &ProbeOptions::default()).await,
            Err(ProxyFetcherError::Probe(_))
        ));
    }

    #[tokio::test]
    async fn test_call_checks_operation_and_arity() {
        let plugin = fetching_plugin();
        assert_err!(plugin.call("missing", vec![]).await);
        assert_err!(plugin.call("fetch", vec![]).await);
        assert_ok!(plugin.call("fetch", vec![json!("u")]).await);
    }

    #[test]
    fn test_capabilities_report_registered_operations() {
        let caps = fetching_plugin().capabilities();
        assert_eq!(caps.arity("fetch"), Some(Arity::Exact(1)));
        assert_eq!(caps.names().collect::<Vec<_>>(), vec!["fetch"]);
    }
}
