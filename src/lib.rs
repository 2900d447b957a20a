//! # proxy-fetcher
//!
//! Fetches public proxy lists from pluggable providers and verifies which
//! proxies actually work.
//!
//! - Provider registry with built-in listing sources
//! - Swappable HTTP client, document adapter and validator, each checked
//!   against its role's required operations when assigned
//! - Concurrent validation with a per-probe deadline and bounded concurrency
//!
//! ## Example
//!
//! ```rust,no_run
//! use proxy_fetcher::{Manager, ValidationOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = Manager::new()?;
//!     let proxies = manager.validated_proxies(Some(ValidationOptions::new())).await?;
//!
//!     for proxy in &proxies {
//!         println!("{} ({:?})", proxy.url(), proxy.latency());
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod manager;
mod pipeline;
mod provider;
mod proxy;
mod registry;
mod validation;

pub mod capability;
pub mod client;
pub mod client_http;
pub mod config;
pub mod context;
pub mod document;
pub mod html;
pub mod plugin;
pub mod providers;
pub mod validator;

pub use capability::{Arity, Capabilities, Role};
pub use client::HttpClient;
pub use client_http::ReqwestClient;
pub use config::{ConfigSnapshot, Configuration, Settings};
pub use context::Context;
pub use document::{Document, DocumentAdapter, Element, LineAdapter, Node};
pub use error::{ProxyFetcherError, Result};
pub use html::ScraperAdapter;
pub use manager::Manager;
pub use pipeline::Fetcher;
pub use plugin::DynamicPlugin;
pub use provider::Provider;
pub use proxy::{ProxyProtocol, ProxyRecord, Validation};
pub use registry::{validate_name, ProviderRegistry};
pub use validation::{ProbeOutcome, ProbeReport, RejectReason, ValidationEngine, ValidationOptions};
pub use validator::{ProbeOptions, ReqwestValidator, Validator};
