//! Configuration types for the squatwatch system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Prober and worker pool settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// History store configuration
    #[serde(default)]
    pub history: HistoryStoreConfig,

    /// Notifier configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// How credential lookup keys are scoped
    #[serde(default)]
    pub credential_scope: CredentialScope,
}

impl MonitorConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            probe: ProbeConfig::default(),
            history: HistoryStoreConfig::default(),
            notifier: NotifierConfig::default(),
            engine: EngineConfig::default(),
            credential_scope: CredentialScope::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.probe.validate()?;
        self.history.validate()?;
        self.notifier.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Prober and probe pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Prober type name used for registry lookup
    #[serde(default = "default_prober")]
    pub prober: String,

    /// Base worker count
    #[serde(default = "default_base_workers")]
    pub base_workers: usize,

    /// Multiplier applied to `base_workers`
    #[serde(default = "default_worker_multiplier")]
    pub worker_multiplier: usize,

    /// Timeout for a single DNS lookup (milliseconds)
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// Whether to query WHOIS for candidates with DNS records
    #[serde(default)]
    pub whois: bool,

    /// Timeout for a single WHOIS exchange (milliseconds)
    #[serde(default = "default_whois_timeout_ms")]
    pub whois_timeout_ms: u64,
}

impl ProbeConfig {
    /// Number of probe workers to start
    pub fn concurrency(&self) -> usize {
        self.base_workers.saturating_mul(self.worker_multiplier)
    }

    /// Per-lookup timeout
    pub fn lookup_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Per-exchange WHOIS timeout
    pub fn whois_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.whois_timeout_ms)
    }

    /// Validate the probe configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.prober.is_empty() {
            return Err(crate::Error::config("Prober type cannot be empty"));
        }
        if self.concurrency() == 0 {
            return Err(crate::Error::config(
                "Probe concurrency must be > 0 (base_workers * worker_multiplier)",
            ));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(crate::Error::config("Lookup timeout must be > 0"));
        }
        if self.whois && self.whois_timeout_ms == 0 {
            return Err(crate::Error::config("WHOIS timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            prober: default_prober(),
            base_workers: default_base_workers(),
            worker_multiplier: default_worker_multiplier(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            whois: false,
            whois_timeout_ms: default_whois_timeout_ms(),
        }
    }
}

fn default_prober() -> String {
    "dns".to_string()
}

fn default_base_workers() -> usize {
    10
}

fn default_worker_multiplier() -> usize {
    20
}

fn default_lookup_timeout_ms() -> u64 {
    2000
}

fn default_whois_timeout_ms() -> u64 {
    5000
}

/// History store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryStoreConfig {
    /// One JSON file per client under `dir`
    File {
        /// Directory holding the history files
        dir: String,
    },

    /// In-memory history (not persistent)
    #[default]
    Memory,

    /// Custom history store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl HistoryStoreConfig {
    /// Validate the history store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            HistoryStoreConfig::File { dir } => {
                if dir.is_empty() {
                    return Err(crate::Error::config("History directory cannot be empty"));
                }
                Ok(())
            }
            HistoryStoreConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom history store factory cannot be empty",
                    ));
                }
                Ok(())
            }
            HistoryStoreConfig::Memory => Ok(()),
        }
    }

    /// Get the history store type name
    pub fn type_name(&self) -> &str {
        match self {
            HistoryStoreConfig::File { .. } => "file",
            HistoryStoreConfig::Memory => "memory",
            HistoryStoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Notifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Emit findings as log events only
    #[default]
    Log,

    /// POST findings to an HTTP endpoint
    Webhook {
        /// Endpoint URL
        url: String,
        /// Bearer token
        token: String,
        /// Log the request instead of sending it
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom notifier
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl NotifierConfig {
    /// Validate the notifier configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            NotifierConfig::Webhook { url, token, .. } => {
                if url.is_empty() {
                    return Err(crate::Error::config("Webhook URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "Webhook URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if token.is_empty() {
                    return Err(crate::Error::config("Webhook token cannot be empty"));
                }
                Ok(())
            }
            NotifierConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom notifier factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom notifier config cannot be null"));
                }
                Ok(())
            }
            NotifierConfig::Log => Ok(()),
        }
    }

    /// Get the notifier type name
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Log => "log",
            NotifierConfig::Webhook { .. } => "webhook",
            NotifierConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Scope of credential lookup keys
///
/// Client-scoped keys let each client point at its own notifier; shared
/// keys serve every client from one set of credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialScope {
    /// `SQUATWATCH_<CLIENT>_<NAME>`
    #[default]
    ClientScoped,
    /// `SQUATWATCH_<NAME>`
    Shared,
}

impl CredentialScope {
    /// Lookup key for a credential
    ///
    /// ```
    /// use squatwatch_core::config::CredentialScope;
    ///
    /// assert_eq!(
    ///     CredentialScope::ClientScoped.key("NOTIFIER_TOKEN", "abc0"),
    ///     "SQUATWATCH_ABC0_NOTIFIER_TOKEN"
    /// );
    /// assert_eq!(
    ///     CredentialScope::Shared.key("NOTIFIER_TOKEN", "abc0"),
    ///     "SQUATWATCH_NOTIFIER_TOKEN"
    /// );
    /// ```
    pub fn key(&self, name: &str, client_code: &str) -> String {
        match self {
            CredentialScope::ClientScoped => format!(
                "SQUATWATCH_{}_{}",
                client_code.to_uppercase().replace('-', "_"),
                name
            ),
            CredentialScope::Shared => format!("SQUATWATCH_{}", name),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between pool-drained checks (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Minimum progress increase (percentage points) between progress logs
    #[serde(default = "default_progress_step_percent")]
    pub progress_step_percent: u32,

    /// Capacity of the monitor event channel
    ///
    /// When full, events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Diff only candidates that have DNS records
    ///
    /// On by default, so unregistered look-alikes never enter history and are
    /// reported once someone registers them. Off diffs every cleaned
    /// candidate.
    #[serde(default = "default_registered_only")]
    pub registered_only: bool,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_ms == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Interval between pool-drained checks
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            progress_step_percent: default_progress_step_percent(),
            event_channel_capacity: default_event_channel_capacity(),
            registered_only: default_registered_only(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_progress_step_percent() -> u32 {
    15
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_registered_only() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_concurrency() {
        let config = ProbeConfig::default();
        assert_eq!(config.concurrency(), 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_webhook_validation() {
        let config = NotifierConfig::Webhook {
            url: "ftp://alerts.internal".to_string(),
            token: "t".to_string(),
            dry_run: false,
        };
        assert!(config.validate().is_err());

        let config = NotifierConfig::Webhook {
            url: "https://alerts.internal/hook".to_string(),
            token: String::new(),
            dry_run: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: MonitorConfig = serde_json::from_str(
            r#"{ "history": { "type": "file", "dir": "/var/lib/squatwatch" } }"#,
        )
        .unwrap();

        assert_eq!(config.history.type_name(), "file");
        assert_eq!(config.notifier.type_name(), "log");
        assert_eq!(config.probe.lookup_timeout_ms, 2000);
        assert_eq!(config.engine.progress_step_percent, 15);
        assert_eq!(config.credential_scope, CredentialScope::ClientScoped);
        assert!(config.engine.registered_only);
    }

    #[test]
    fn test_registered_only_defaults_on() {
        assert!(EngineConfig::default().registered_only);

        let engine: EngineConfig = serde_json::from_str(r#"{ "poll_interval_ms": 50 }"#).unwrap();
        assert!(engine.registered_only);

        let engine: EngineConfig =
            serde_json::from_str(r#"{ "registered_only": false }"#).unwrap();
        assert!(!engine.registered_only);
    }

    #[test]
    fn test_client_scoped_key_normalizes_client() {
        assert_eq!(
            CredentialScope::ClientScoped.key("NOTIFIER_URL", "acme-eu"),
            "SQUATWATCH_ACME_EU_NOTIFIER_URL"
        );
    }
}
