//! Root domain parsing and hostname validation

use super::tables::MULTI_LABEL_SUFFIXES;
use crate::error::{Error, Result};

/// A parsed root domain
///
/// The host is split into `subdomain`, the registrable `domain` label and
/// the public suffix `tld`, so mutation rules only touch the part a
/// squatter would register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDomain {
    scheme: Option<String>,
    host: String,
    path: Option<String>,
    query: Option<String>,
    subdomain: String,
    domain: String,
    tld: String,
}

impl RootDomain {
    /// Parse `[scheme://]host[/path][?query]`
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::invalid_input("Domain cannot be empty"));
        }

        let (scheme, rest) = match input.split_once("://") {
            Some((scheme, rest)) => {
                let scheme = scheme.to_ascii_lowercase();
                if scheme != "http" && scheme != "https" {
                    return Err(Error::invalid_input(format!(
                        "Unsupported scheme '{}' in '{}'",
                        scheme, input
                    )));
                }
                (Some(scheme), rest)
            }
            None => (None, input),
        };

        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query.to_string())),
            None => (rest, None),
        };

        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], Some(rest[idx..].to_string())),
            None => (rest, None),
        };

        if host.contains(':') {
            return Err(Error::invalid_input(format!(
                "Ports are not supported in the root domain: '{}'",
                host
            )));
        }

        let host = host.trim_end_matches('.').to_ascii_lowercase();
        if let Some(reason) = hostname_error(&host) {
            return Err(Error::invalid_input(format!(
                "'{}' is not a valid domain: {}",
                input, reason
            )));
        }

        let labels: Vec<&str> = host.split('.').collect();
        let suffix_len = if labels.len() >= 3 {
            let last_two = labels[labels.len() - 2..].join(".");
            if MULTI_LABEL_SUFFIXES.contains(&last_two.as_str()) { 2 } else { 1 }
        } else {
            1
        };

        let domain_idx = labels.len() - suffix_len - 1;
        let subdomain = labels[..domain_idx].join(".");
        let domain = labels[domain_idx].to_string();
        let tld = labels[domain_idx + 1..].join(".");

        Ok(Self {
            scheme,
            host,
            path,
            query,
            subdomain,
            domain,
            tld,
        })
    }

    /// Full lower-cased host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Labels left of the registrable domain (may be empty)
    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    /// Registrable label
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Public suffix
    pub fn tld(&self) -> &str {
        &self.tld
    }

    /// Registrable domain: `domain.tld`
    pub fn registrable(&self) -> String {
        format!("{}.{}", self.domain, self.tld)
    }

    /// URI scheme, if one was given
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// URI path, if one was given
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// URI query, if one was given
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Re-assemble a host from a mutated registrable label and a suffix
    pub(crate) fn assemble(&self, label: &str, tld: &str) -> String {
        if self.subdomain.is_empty() {
            format!("{}.{}", label, tld)
        } else {
            format!("{}.{}.{}", self.subdomain, label, tld)
        }
    }
}

/// True if `host` is a syntactically valid, lower-case hostname
pub fn is_valid_hostname(host: &str) -> bool {
    hostname_error(host).is_none()
}

/// Reason `host` is not a valid hostname, if any
fn hostname_error(host: &str) -> Option<String> {
    if host.is_empty() {
        return Some("empty host".to_string());
    }

    // RFC 1035: 253 chars max
    if host.len() > 253 {
        return Some(format!("too long: {} chars (max 253)", host.len()));
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Some("needs at least two labels".to_string());
    }

    for label in &labels {
        if label.is_empty() {
            return Some("empty label".to_string());
        }
        if label.len() > 63 {
            return Some(format!("label too long: '{}'", label));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Some(format!("invalid characters in label '{}'", label));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Some(format!("label '{}' starts or ends with a hyphen", label));
        }
    }

    if labels
        .last()
        .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Some("numeric top-level label".to_string());
    }

    None
}
