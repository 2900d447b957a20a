//! xroxy.com proxy list.

use tracing::debug;

use crate::document::{Document, Node};
use crate::{Provider, ProxyProtocol, ProxyRecord, Result};

const XROXY_URL: &str = "https://www.xroxy.com/proxylist.php";

/// Number of listing pages fetched by default.
const DEFAULT_PAGES: usize = 3;

/// Proxies listed on xroxy.com.
///
/// Table columns: address, port, type, ssl, country, latency, reliability.
/// The type column mixes protocols ("Socks5") and anonymity levels
/// ("Anonymous", "Transparent").
pub struct Xroxy {
    pages: usize,
}

impl Xroxy {
    pub fn new() -> Self {
        Self {
            pages: DEFAULT_PAGES,
        }
    }

    /// Sets how many listing pages are fetched.
    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages.max(1);
        self
    }

    fn to_proxy(cells: &[String]) -> Result<ProxyRecord> {
        let host = cells.first().map(String::as_str).unwrap_or_default();
        let port = cells.get(1).map(String::as_str).unwrap_or_default();
        let kind = cells.get(2).map(String::as_str).unwrap_or_default();
        let ssl = cells.get(3).is_some_and(|c| c.eq_ignore_ascii_case("true"));

        let protocol = match kind.parse().unwrap_or(ProxyProtocol::Unknown) {
            ProxyProtocol::Unknown | ProxyProtocol::Http if ssl => ProxyProtocol::Https,
            ProxyProtocol::Unknown => ProxyProtocol::Http,
            protocol => protocol,
        };

        let mut proxy = ProxyRecord::parse(host, port)?.with_protocol(protocol);
        if !kind.to_ascii_lowercase().starts_with("socks") {
            proxy = proxy.with_anonymity(kind);
        }
        if let Some(country) = cells.get(4) {
            proxy = proxy.with_country(country.as_str());
        }
        Ok(proxy)
    }
}

impl Default for Xroxy {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for Xroxy {
    fn name(&self) -> &str {
        "xroxy"
    }

    fn description(&self) -> &str {
        "HTTP and SOCKS proxies from xroxy.com"
    }

    fn listing_urls(&self) -> Vec<String> {
        (0..self.pages)
            .map(|page| {
                format!(
                    "{}?port=&type=All_http&ssl=&country=&latency=&reliability=&sort=reliability&desc=true&pnum={}",
                    XROXY_URL, page
                )
            })
            .collect()
    }

    fn extract(&self, document: &Document) -> Result<Vec<ProxyRecord>> {
        let mut proxies = Vec::new();
        for row in document.find_all("table tbody tr")? {
            let cells = row.cells("td")?;
            match Self::to_proxy(&cells) {
                Ok(proxy) => proxies.push(proxy),
                Err(e) => debug!("xroxy: skipping row {:?}: {}", cells, e),
            }
        }
        Ok(proxies)
    }
}
