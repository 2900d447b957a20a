//! Proxy list provider trait.

use crate::capability::{Capabilities, Role};
use crate::document::Document;
use crate::{ProxyRecord, Result};

/// Trait for implementing proxy list providers.
///
/// A provider knows where its listing lives and how to read records out of a
/// parsed listing page. Fetching and parsing are done by the configured HTTP
/// client and document adapter, so a provider never performs I/O itself.
pub trait Provider: Send + Sync {
    /// Registry name of the provider.
    fn name(&self) -> &str;

    /// URLs of the listing pages to fetch, in order.
    fn listing_urls(&self) -> Vec<String>;

    /// Extracts proxy records from one parsed listing page.
    ///
    /// Rows that cannot be read are skipped rather than failing the page.
    fn extract(&self, document: &Document) -> Result<Vec<ProxyRecord>>;

    /// Short human readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Operations this provider exports.
    fn capabilities(&self) -> Capabilities {
        Role::Provider.capabilities()
    }
}
