// # DNS Prober
//
// This crate provides the network prober for the squatwatch monitor.
//
// ## Lookups
//
// For every candidate it asks the system resolver for NS and A records,
// concurrently, each bounded by the configured lookup timeout. A candidate
// with at least one record is "registered". When WHOIS is enabled,
// registered candidates also get a creation-date lookup.
//
// ## Failure model
//
// NXDOMAIN and empty answers are normal: they produce empty record lists.
// A probe only fails when both lookups error out (timeout, SERVFAIL,
// unreachable resolver). WHOIS problems never fail a probe.

mod whois;

pub use whois::{IANA_WHOIS, WhoisClient, parse_creation_date, parse_referral};

use squatwatch_core::PluginRegistry;
use squatwatch_core::config::ProbeConfig;
use squatwatch_core::traits::{Prober, ProberFactory};
use squatwatch_core::variant::{DomainVariant, ProbeRecords};
use squatwatch_core::{Error, Result};

use hickory_resolver::ResolveError;
use hickory_resolver::TokioResolver;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Registry name of this prober
pub const PROBER_NAME: &str = "dns";

/// Outcome of one record lookup
enum Lookup {
    Found(Vec<String>),
    Failed(String),
}

/// DNS (and optional WHOIS) prober backed by hickory
pub struct DnsProber {
    resolver: TokioResolver,

    /// Bound for each individual DNS lookup
    lookup_timeout: Duration,

    /// Present when WHOIS lookups are enabled
    whois: Option<WhoisClient>,
}

impl DnsProber {
    /// Create a prober using the system resolver configuration
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let resolver = TokioResolver::builder_tokio()
            .map_err(|e| Error::config(format!("Failed to create DNS resolver: {}", e)))?
            .build();

        let whois = config.whois.then(|| WhoisClient::new(config.whois_timeout()));

        Ok(Self {
            resolver,
            lookup_timeout: config.lookup_timeout(),
            whois,
        })
    }

    /// Run one lookup under the timeout, folding "no records" into success
    async fn bounded<F, T>(&self, kind: &str, lookup: F) -> Lookup
    where
        F: Future<Output = std::result::Result<T, ResolveError>>,
        T: IntoIterator,
        T::Item: ToString,
    {
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(records)) => Lookup::Found(records.into_iter().map(|r| r.to_string()).collect()),
            Ok(Err(e)) if e.is_no_records_found() => Lookup::Found(Vec::new()),
            Ok(Err(e)) => Lookup::Failed(format!("{} lookup: {}", kind, e)),
            Err(_) => Lookup::Failed(format!(
                "{} lookup timed out after {:?}",
                kind, self.lookup_timeout
            )),
        }
    }
}

#[async_trait::async_trait]
impl Prober for DnsProber {
    async fn probe(&self, variant: &DomainVariant) -> Result<ProbeRecords> {
        let name = &variant.domain_name;
        // Fully qualified, so search domains never apply
        let fqdn = format!("{}.", name);

        let (ns, a) = tokio::join!(
            self.bounded("NS", async { self.resolver.ns_lookup(fqdn.as_str()).await }),
            self.bounded("A", async { self.resolver.ipv4_lookup(fqdn.as_str()).await }),
        );

        let (dns_ns, dns_a) = match (ns, a) {
            (Lookup::Failed(ns_err), Lookup::Failed(a_err)) => {
                return Err(Error::probe(name, format!("{}; {}", ns_err, a_err)));
            }
            (ns, a) => (records_or_empty(name, ns), records_or_empty(name, a)),
        };

        let mut records = ProbeRecords {
            dns_a,
            dns_ns,
            whois_created: None,
        };

        if let Some(whois) = &self.whois {
            if !records.dns_a.is_empty() || !records.dns_ns.is_empty() {
                records.whois_created = match whois.creation_date(name).await {
                    Ok(date) => date,
                    Err(e) => {
                        tracing::debug!(domain = %name, "WHOIS lookup failed: {}", e);
                        None
                    }
                };
            }
        }

        Ok(records)
    }

    fn prober_name(&self) -> &'static str {
        PROBER_NAME
    }
}

/// One failed lookup out of two degrades to an empty list
fn records_or_empty(name: &str, lookup: Lookup) -> Vec<String> {
    match lookup {
        Lookup::Found(records) => records,
        Lookup::Failed(message) => {
            tracing::debug!(domain = %name, "{}", message);
            Vec::new()
        }
    }
}

/// Factory for creating DNS probers
pub struct DnsProberFactory;

impl ProberFactory for DnsProberFactory {
    fn create(&self, config: &ProbeConfig) -> Result<Arc<dyn Prober>> {
        Ok(Arc::new(DnsProber::new(config)?))
    }
}

/// Register the DNS prober with a registry
pub fn register(registry: &PluginRegistry) {
    registry.register_prober(PROBER_NAME, Box::new(DnsProberFactory));
}
