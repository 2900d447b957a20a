//! ProxyScrape plain-text API.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{Document, Node};
use crate::{Provider, ProxyProtocol, ProxyRecord, Result};

const PROXYSCRAPE_URL: &str = "https://api.proxyscrape.com/v2/?request=getproxies&timeout=10000&country=all&ssl=all&anonymity=all";

static ADDR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3}(?:\.\d{1,3}){3}):(\d{1,5})\b").expect("valid address regex")
});

/// Proxies from the ProxyScrape API, one `ip:port` per line.
///
/// The body is plain text, so extraction works on the document's text
/// regardless of which adapter parsed it.
pub struct Proxyscrape {
    protocol: ProxyProtocol,
}

impl Proxyscrape {
    /// HTTP proxies.
    pub fn http() -> Self {
        Self {
            protocol: ProxyProtocol::Http,
        }
    }

    /// SOCKS4 proxies.
    pub fn socks4() -> Self {
        Self {
            protocol: ProxyProtocol::Socks4,
        }
    }

    /// SOCKS5 proxies.
    pub fn socks5() -> Self {
        Self {
            protocol: ProxyProtocol::Socks5,
        }
    }
}

impl Provider for Proxyscrape {
    fn name(&self) -> &str {
        match self.protocol {
            ProxyProtocol::Socks4 => "proxyscrape_socks4",
            ProxyProtocol::Socks5 => "proxyscrape_socks5",
            _ => "proxyscrape_http",
        }
    }

    fn description(&self) -> &str {
        "Plain-text proxy lists from api.proxyscrape.com"
    }

    fn listing_urls(&self) -> Vec<String> {
        vec![format!("{}&protocol={}", PROXYSCRAPE_URL, self.protocol.scheme())]
    }

    fn extract(&self, document: &Document) -> Result<Vec<ProxyRecord>> {
        let text = document.text();
        let proxies = ADDR_RE
            .captures_iter(&text)
            .filter_map(|cap| ProxyRecord::parse(&cap[1], &cap[2]).ok())
            .map(|proxy| proxy.with_protocol(self.protocol))
            .collect();
        Ok(proxies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentAdapter, LineAdapter};

    #[test]
    fn test_proxyscrape_names() {
        assert_eq!(Proxyscrape::http().name(), "proxyscrape_http");
        assert_eq!(Proxyscrape::socks4().name(), "proxyscrape_socks4");
        assert_eq!(Proxyscrape::socks5().name(), "proxyscrape_socks5");
    }

    #[test]
    fn test_proxyscrape_listing_url() {
        let urls = Proxyscrape::socks5().listing_urls();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].ends_with("&protocol=socks5"));
    }

    #[test]
    fn test_extract_lines() {
        let body = "1.2.3.4:80\r\n5.6.7.8:3128\r\nnot a proxy\r\n9.9.9.9:0\r\n";
        let doc = LineAdapter::new().parse(body).unwrap();
        let proxies = Proxyscrape::socks4().extract(&doc).unwrap();
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[0].addr(), "1.2.3.4:80");
        assert_eq!(proxies[1].protocol(), ProxyProtocol::Socks4);
    }

    #[test]
    fn test_extract_empty_body() {
        let doc = LineAdapter::new().parse("").unwrap();
        assert!(Proxyscrape::http().extract(&doc).unwrap().is_empty());
    }
}
