//! Concurrent proxy validation.
//!
//! Every candidate is probed once through the configured [`Validator`] with
//! its own deadline. At most `max_concurrency` probes are in flight at any
//! moment; a slow probe only holds its own slot. Probe failures are outcomes,
//! not errors: the engine always returns, possibly with an empty list.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{ConfigSnapshot, DEFAULT_MAX_CONCURRENCY};
use crate::validator::{ProbeOptions, Validator, DEFAULT_PROBE_TIMEOUT};
use crate::ProxyRecord;

/// Why a probe did not verify its proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The validator answered "not connectable".
    NotConnectable,
    /// The probe did not finish before its deadline.
    Timeout,
    /// The validator failed.
    Error(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NotConnectable => f.write_str("not connectable"),
            RejectReason::Timeout => f.write_str("timed out"),
            RejectReason::Error(msg) => write!(f, "probe error: {}", msg),
        }
    }
}

/// Result of probing one proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The proxy answered within its deadline.
    Verified {
        /// Time from probe start to the validator's answer.
        latency: Duration,
    },
    /// The proxy could not be confirmed.
    Rejected {
        /// Why the probe failed.
        reason: RejectReason,
    },
}

impl ProbeOutcome {
    fn rejected(reason: RejectReason) -> Self {
        ProbeOutcome::Rejected { reason }
    }

    /// Returns whether the probe confirmed the proxy.
    pub fn is_verified(&self) -> bool {
        matches!(self, ProbeOutcome::Verified { .. })
    }

    /// Observed latency of a verified probe.
    pub fn latency(&self) -> Option<Duration> {
        match self {
            ProbeOutcome::Verified { latency } => Some(*latency),
            ProbeOutcome::Rejected { .. } => None,
        }
    }
}

/// A probed proxy with its outcome.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Position of the proxy in the input.
    pub index: usize,
    /// The proxy, annotated with the outcome.
    pub proxy: ProxyRecord,
    /// How the probe ended.
    pub outcome: ProbeOutcome,
}

/// Per-call overrides of the configured validation tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Per-probe deadline; the configured timeout when `None`.
    pub timeout: Option<Duration>,
    /// Probes in flight at once; the configured limit when `None`.
    pub max_concurrency: Option<usize>,
}

impl ValidationOptions {
    /// Creates options that override nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the per-probe deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the number of probes in flight at once.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }
}

/// Probes proxies with bounded concurrency.
#[derive(Clone)]
pub struct ValidationEngine {
    validator: Arc<dyn Validator>,
    timeout: Duration,
    max_concurrency: usize,
}

impl ValidationEngine {
    /// Creates an engine with the default timeout and concurrency.
    pub fn new(validator: Arc<dyn Validator>) -> Self {
        Self {
            validator,
            timeout: DEFAULT_PROBE_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Creates an engine from a configuration snapshot.
    pub fn from_config(config: &ConfigSnapshot) -> Self {
        Self::new(Arc::clone(&config.validator))
            .with_timeout(config.timeout)
            .with_max_concurrency(config.max_concurrency)
    }

    /// Sets the per-probe deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of probes allowed in flight. Zero is treated as one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Applies per-call overrides.
    pub fn with_options(self, options: &ValidationOptions) -> Self {
        let engine = match options.timeout {
            Some(timeout) => self.with_timeout(timeout),
            None => self,
        };
        match options.max_concurrency {
            Some(max_concurrency) => engine.with_max_concurrency(max_concurrency),
            None => engine,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Returns the verified proxies, annotated, in input order.
    pub async fn validate(&self, records: Vec<ProxyRecord>) -> Vec<ProxyRecord> {
        self.probe_all(records)
            .await
            .into_iter()
            .filter(|report| report.outcome.is_verified())
            .map(|report| report.proxy)
            .collect()
    }

    /// Probes every proxy and returns one report per input, in input order.
    ///
    /// Dropping the returned future abandons all outstanding probes.
    pub async fn probe_all(&self, records: Vec<ProxyRecord>) -> Vec<ProbeReport> {
        if records.is_empty() {
            return Vec::new();
        }

        let total = records.len();
        let start = Instant::now();
        let options = ProbeOptions {
            timeout: self.timeout,
        };
        let options = &options;

        let mut reports: Vec<ProbeReport> = stream::iter(records.into_iter().enumerate())
            .map(|(index, mut proxy)| async move {
                let outcome = self.probe(&proxy, options).await;
                proxy.annotate(outcome.is_verified(), outcome.latency());
                ProbeReport {
                    index,
                    proxy,
                    outcome,
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;
        reports.sort_by_key(|report| report.index);

        let verified = reports.iter().filter(|r| r.outcome.is_verified()).count();
        info!(
            "Validated {} proxies: {} verified in {}ms",
            total,
            verified,
            start.elapsed().as_millis()
        );
        reports
    }

    async fn probe(&self, proxy: &ProxyRecord, options: &ProbeOptions) -> ProbeOutcome {
        let start = Instant::now();
        let probe = AssertUnwindSafe(self.validator.connectable(proxy, options)).catch_unwind();

        let outcome = match timeout(options.timeout, probe).await {
            Ok(Ok(Ok(true))) => ProbeOutcome::Verified {
                latency: start.elapsed(),
            },
            Ok(Ok(Ok(false))) => ProbeOutcome::rejected(RejectReason::NotConnectable),
            Ok(Ok(Err(e))) => ProbeOutcome::rejected(RejectReason::Error(e.to_string())),
            Ok(Err(_)) => {
                warn!("Probe of {} panicked", proxy);
                ProbeOutcome::rejected(RejectReason::Error("probe panicked".to_string()))
            }
            Err(_) => ProbeOutcome::rejected(RejectReason::Timeout),
        };
        debug!("Probe {}: {:?}", proxy, outcome);
        outcome
    }
}

impl fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("timeout", &self.timeout)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}
