//! Minimal WHOIS client (RFC 3912)
//!
//! Asks `whois.iana.org` which server is authoritative for a suffix, then
//! queries that server for the domain and extracts the creation date.
//! Referrals are cached per suffix for the lifetime of the client. Concurrent
//! lookups under one suffix share a single IANA query.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use squatwatch_core::fuzz::RootDomain;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OnceCell};

/// IANA root WHOIS server
pub const IANA_WHOIS: &str = "whois.iana.org";

const WHOIS_PORT: u16 = 43;

/// Responses larger than this are truncated
const MAX_RESPONSE_BYTES: u64 = 64 * 1024;

/// Keys whose value is a creation date, lower-cased
const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created",
    "created on",
    "registered on",
    "registration date",
    "registration time",
    "domain registration date",
    "domain name commencement date",
];

/// Date formats tried after RFC 3339
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d.%m.%Y", "%Y/%m/%d", "%d/%m/%Y"];

/// WHOIS lookups over TCP port 43
pub struct WhoisClient {
    timeout: Duration,
    /// Server asked for referrals, `whois.iana.org:43` unless overridden
    root: (String, u16),
    /// Referral per top-level suffix; a failed query leaves the cell empty
    referrals: Mutex<HashMap<String, Arc<OnceCell<Option<String>>>>>,
}

impl WhoisClient {
    /// Create a client; `timeout` bounds each TCP exchange
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            root: (IANA_WHOIS.to_string(), WHOIS_PORT),
            referrals: Mutex::new(HashMap::new()),
        }
    }

    /// Ask `host:port` for referrals instead of IANA
    pub fn with_root_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.root = (host.into(), port);
        self
    }

    /// Creation date of the domain registered under `name`
    ///
    /// `Ok(None)` when no server is known for the suffix or the response
    /// carries no recognisable date.
    pub async fn creation_date(&self, name: &str) -> Result<Option<NaiveDate>, String> {
        let parsed = RootDomain::parse(name).map_err(|e| e.to_string())?;
        let Some(server) = self.server_for(parsed.tld()).await? else {
            tracing::debug!("No WHOIS server for .{}", parsed.tld());
            return Ok(None);
        };

        let response = self.query(&server, WHOIS_PORT, &parsed.registrable()).await?;
        Ok(parse_creation_date(&response))
    }

    /// Authoritative server for a suffix, via IANA referral
    async fn server_for(&self, tld: &str) -> Result<Option<String>, String> {
        let top = tld.rsplit('.').next().unwrap_or(tld).to_string();

        let cell = Arc::clone(self.referrals.lock().await.entry(top.clone()).or_default());

        let server = cell
            .get_or_try_init(|| async {
                let (host, port) = &self.root;
                let response = self.query(host, *port, &top).await?;
                Ok::<_, String>(parse_referral(&response))
            })
            .await?;
        Ok(server.clone())
    }

    /// One request/response exchange
    async fn query(&self, server: &str, port: u16, query: &str) -> Result<String, String> {
        let exchange = async {
            let mut stream = TcpStream::connect((server, port))
                .await
                .map_err(|e| format!("connect to {}: {}", server, e))?;
            stream
                .write_all(format!("{}\r\n", query).as_bytes())
                .await
                .map_err(|e| format!("write to {}: {}", server, e))?;

            let mut body = Vec::new();
            stream
                .take(MAX_RESPONSE_BYTES)
                .read_to_end(&mut body)
                .await
                .map_err(|e| format!("read from {}: {}", server, e))?;
            Ok::<_, String>(String::from_utf8_lossy(&body).into_owned())
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| format!("WHOIS query to {} timed out after {:?}", server, self.timeout))?
    }
}

/// Referred WHOIS server from an IANA response
pub fn parse_referral(response: &str) -> Option<String> {
    response.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if (key == "refer" || key == "whois") && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// First creation date found in a WHOIS response
pub fn parse_creation_date(response: &str) -> Option<NaiveDate> {
    response.lines().find_map(|line| {
        let (key, value) = line.trim().split_once(':')?;
        let key = key.trim().to_ascii_lowercase();
        if !CREATION_KEYS.contains(&key.as_str()) {
            return None;
        }
        parse_date(value.trim())
    })
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    // "2019-01-01T00:00:00Z", "2019-01-01 12:00:00 CLST", "01-Jan-2019"
    let token = value.split(|c: char| c.is_whitespace() || c == 'T').next()?;
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(token, format).ok())
}
