//! Proxy records extracted from provider listings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::{ProxyFetcherError, Result};

/// Proxy protocol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    /// HTTP proxy
    #[default]
    Http,
    /// HTTPS proxy
    Https,
    /// SOCKS4 proxy
    Socks4,
    /// SOCKS5 proxy
    Socks5,
    /// Listing did not state a usable protocol
    Unknown,
}

impl ProxyProtocol {
    /// URL scheme for this protocol. Unknown protocols are tried as plain HTTP.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http | ProxyProtocol::Unknown => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks4 => "socks4",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

impl fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyProtocol::Unknown => f.write_str("unknown"),
            other => f.write_str(other.scheme()),
        }
    }
}

impl FromStr for ProxyProtocol {
    type Err = std::convert::Infallible;

    /// Parses the protocol labels used by listing sites ("HTTP", "https",
    /// "Socks4", "SOCKS5", "Anonymous"...). Unrecognised labels map to `Unknown`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let protocol = match s.trim().to_ascii_lowercase().as_str() {
            "http" => ProxyProtocol::Http,
            "https" | "ssl" => ProxyProtocol::Https,
            "socks4" | "socks4a" => ProxyProtocol::Socks4,
            "socks5" | "socks5h" | "socks" => ProxyProtocol::Socks5,
            _ => ProxyProtocol::Unknown,
        };
        Ok(protocol)
    }
}

/// Outcome attached to a record once it has been probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Whether the probe confirmed the proxy is usable.
    pub verified: bool,
    /// When the probe finished.
    pub checked_at: DateTime<Utc>,
    /// Observed round trip, if the probe succeeded.
    pub latency: Option<Duration>,
}

/// A candidate proxy endpoint.
///
/// Identity fields are fixed at extraction time. The only later mutation is the
/// validation annotation attached by [`crate::ValidationEngine`].
///
/// Deserializing goes through [`ProxyRecord::new`], so the host and port are
/// checked and any serialized `validation` is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyRecord {
    host: String,
    port: u16,
    protocol: ProxyProtocol,
    country: Option<String>,
    anonymity: Option<String>,
    validation: Option<Validation>,
}

impl ProxyRecord {
    /// Creates a new record. Port 0 is rejected.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host: String = host.into();
        let host = host.trim();
        if host.is_empty() {
            return Err(ProxyFetcherError::Parse("Empty proxy host".to_string()));
        }
        if port == 0 {
            return Err(ProxyFetcherError::Parse(format!(
                "Invalid port 0 for host {}",
                host
            )));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            protocol: ProxyProtocol::Http,
            country: None,
            anonymity: None,
            validation: None,
        })
    }

    /// Creates a record from the textual host and port cells of a listing.
    pub fn parse(host: &str, port: &str) -> Result<Self> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| ProxyFetcherError::Parse(format!("Invalid port '{}'", port.trim())))?;
        Self::new(host, port)
    }

    /// Sets the proxy protocol.
    pub fn with_protocol(mut self, protocol: ProxyProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Sets the country as written in the listing.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = non_empty(country.into());
        self
    }

    /// Sets the anonymity level as written in the listing.
    pub fn with_anonymity(mut self, anonymity: impl Into<String>) -> Self {
        self.anonymity = non_empty(anonymity.into());
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn protocol(&self) -> ProxyProtocol {
        self.protocol
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn anonymity(&self) -> Option<&str> {
        self.anonymity.as_deref()
    }

    /// Validation annotation, present once the record has been probed.
    pub fn validation(&self) -> Option<&Validation> {
        self.validation.as_ref()
    }

    /// Returns whether a probe confirmed this proxy.
    pub fn is_verified(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| v.verified)
    }

    /// Observed probe latency, if verified.
    pub fn latency(&self) -> Option<Duration> {
        self.validation.as_ref().and_then(|v| v.latency)
    }

    /// Returns the "host:port" address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the proxy URL string.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    pub fn is_ssl(&self) -> bool {
        self.protocol == ProxyProtocol::Https
    }

    pub fn is_http(&self) -> bool {
        matches!(self.protocol, ProxyProtocol::Http | ProxyProtocol::Https)
    }

    pub fn is_socks(&self) -> bool {
        matches!(self.protocol, ProxyProtocol::Socks4 | ProxyProtocol::Socks5)
    }

    pub(crate) fn annotate(&mut self, verified: bool, latency: Option<Duration>) {
        self.validation = Some(Validation {
            verified,
            checked_at: Utc::now(),
            latency,
        });
    }
}

#[derive(Deserialize)]
struct RawProxyRecord {
    host: String,
    port: u16,
    #[serde(default)]
    protocol: ProxyProtocol,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    anonymity: Option<String>,
}

impl<'de> Deserialize<'de> for ProxyRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawProxyRecord::deserialize(deserializer)?;
        let mut record = ProxyRecord::new(raw.host, raw.port)
            .map_err(de::Error::custom)?
            .with_protocol(raw.protocol);
        if let Some(country) = raw.country {
            record = record.with_country(country);
        }
        if let Some(anonymity) = raw.anonymity {
            record = record.with_anonymity(anonymity);
        }
        Ok(record)
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
