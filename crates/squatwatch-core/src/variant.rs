//! Domain variant model
//!
//! A [`DomainVariant`] is created by the generator, annotated in place by the
//! probe worker that dequeued it, and read-only from aggregation onwards.

use serde::{Deserialize, Serialize};

/// A candidate domain produced by one mutation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DomainVariant {
    /// Name of the rule that produced this candidate
    pub fuzzer: String,

    /// The candidate domain string
    pub domain_name: String,

    /// A records found while probing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_a: Option<Vec<String>>,

    /// NS records found while probing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_ns: Option<Vec<String>>,

    /// Registration date reported by WHOIS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_created: Option<chrono::NaiveDate>,
}

impl DomainVariant {
    /// Create an unprobed variant
    pub fn new(fuzzer: impl Into<String>, domain_name: impl Into<String>) -> Self {
        Self {
            fuzzer: fuzzer.into(),
            domain_name: domain_name.into(),
            dns_a: None,
            dns_ns: None,
            whois_created: None,
        }
    }

    /// Attach probe results
    ///
    /// Empty record lists are stored as `None` so a variant either has data
    /// for a record type or omits it.
    pub fn apply(&mut self, records: ProbeRecords) {
        self.dns_a = non_empty(records.dns_a);
        self.dns_ns = non_empty(records.dns_ns);
        self.whois_created = records.whois_created;
    }

    /// True if at least one A or NS record was found
    pub fn is_hit(&self) -> bool {
        self.dns_a.as_ref().is_some_and(|a| !a.is_empty())
            || self.dns_ns.as_ref().is_some_and(|ns| !ns.is_empty())
    }

    /// JSON form used for history payloads and notifier raw data
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "domain-name": self.domain_name, "fuzzer": self.fuzzer })
        })
    }
}

fn non_empty(records: Vec<String>) -> Option<Vec<String>> {
    if records.is_empty() { None } else { Some(records) }
}

/// Records discovered for a single candidate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeRecords {
    /// A records
    pub dns_a: Vec<String>,
    /// NS records
    pub dns_ns: Vec<String>,
    /// WHOIS creation date
    pub whois_created: Option<chrono::NaiveDate>,
}

impl ProbeRecords {
    /// True if nothing was found
    pub fn is_empty(&self) -> bool {
        self.dns_a.is_empty() && self.dns_ns.is_empty() && self.whois_created.is_none()
    }
}
