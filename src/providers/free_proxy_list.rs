//! free-proxy-list.net and its SSL mirror.

use tracing::debug;

use crate::document::{Document, Node};
use crate::{Provider, ProxyProtocol, ProxyRecord, Result};

const FREE_PROXY_LIST_URL: &str = "https://free-proxy-list.net/";
const SSL_PROXIES_URL: &str = "https://www.sslproxies.org/";

/// Rows of the listing table.
const ROW_SELECTOR: &str = "table tbody tr";

/// Proxies listed on free-proxy-list.net.
///
/// Table columns: IP, port, code, country, anonymity, google, https, last checked.
pub struct FreeProxyList {
    name: &'static str,
    url: &'static str,
    ssl_only: bool,
}

impl FreeProxyList {
    /// Creates the HTTP(S) listing provider.
    pub fn new() -> Self {
        Self {
            name: "free_proxy_list",
            url: FREE_PROXY_LIST_URL,
            ssl_only: false,
        }
    }

    /// Creates the SSL-only listing provider (sslproxies.org).
    pub fn ssl() -> Self {
        Self {
            name: "free_proxy_list_ssl",
            url: SSL_PROXIES_URL,
            ssl_only: true,
        }
    }

    fn to_proxy(&self, cells: &[String]) -> Result<ProxyRecord> {
        let host = cells.first().map(String::as_str).unwrap_or_default();
        let port = cells.get(1).map(String::as_str).unwrap_or_default();
        let https = cells.get(6).is_some_and(|c| c.eq_ignore_ascii_case("yes"));

        let protocol = if self.ssl_only || https {
            ProxyProtocol::Https
        } else {
            ProxyProtocol::Http
        };

        let mut proxy = ProxyRecord::parse(host, port)?.with_protocol(protocol);
        if let Some(country) = cells.get(3) {
            proxy = proxy.with_country(country.as_str());
        }
        if let Some(anonymity) = cells.get(4) {
            proxy = proxy.with_anonymity(anonymity.as_str());
        }
        Ok(proxy)
    }
}

impl Default for FreeProxyList {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for FreeProxyList {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        if self.ssl_only {
            "SSL proxies from sslproxies.org"
        } else {
            "HTTP/HTTPS proxies from free-proxy-list.net"
        }
    }

    fn listing_urls(&self) -> Vec<String> {
        vec![self.url.to_string()]
    }

    fn extract(&self, document: &Document) -> Result<Vec<ProxyRecord>> {
        let mut proxies = Vec::new();
        for row in document.find_all(ROW_SELECTOR)? {
            let cells = row.cells("td")?;
            match self.to_proxy(&cells) {
                Ok(proxy) => proxies.push(proxy),
                Err(e) => debug!("{}: skipping row {:?}: {}", self.name, cells, e),
            }
        }
        Ok(proxies)
    }
}
