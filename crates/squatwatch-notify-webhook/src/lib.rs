// # Webhook Notifier
//
// This crate delivers Finding Batches to an HTTP endpoint, typically the
// intake of a ticketing system.
//
// ## Request
//
// One `POST` per batch, `Authorization: Bearer <token>`, JSON body:
//
// ```json
// { "findings": [ { "original-domain": "...", "detected-domain": "...",
//                   "client-code": "...", "raw-data": { ... } } ] }
// ```
//
// ## Constraints
//
// - One request per `notify` call, no retry (a failed batch is at most
//   re-sent by a later run)
// - The token never appears in logs or Debug output
// - `dry_run` logs the request instead of sending it

use async_trait::async_trait;
use serde::Serialize;
use squatwatch_core::config::NotifierConfig;
use squatwatch_core::traits::{Finding, Notifier, NotifierFactory};
use squatwatch_core::{Error, PluginRegistry, Result};
use std::time::Duration;

/// Registry name of this notifier
pub const NOTIFIER_NAME: &str = "webhook";

/// Default HTTP timeout for a delivery (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body
#[derive(Serialize)]
struct Payload<'a> {
    findings: &'a [Finding],
}

/// Notifier that POSTs findings to a webhook
pub struct WebhookNotifier {
    url: String,

    /// Bearer token
    /// ⚠️ NEVER log this value
    token: String,

    client: reqwest::Client,

    /// Log the request instead of sending it
    dry_run: bool,
}

// Hides the token
impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("url", &self.url)
            .field("token", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl WebhookNotifier {
    /// Create a webhook notifier
    ///
    /// Fails with `Error::Config` when the URL or token is empty, or the
    /// HTTP client cannot be built.
    pub fn new(url: impl Into<String>, token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let url = url.into();
        let token = token.into();

        if url.is_empty() {
            return Err(Error::config("Webhook URL cannot be empty"));
        }
        if token.is_empty() {
            return Err(Error::config("Webhook token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url,
            token,
            client,
            dry_run,
        })
    }

    /// Whether requests are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, findings: &[Finding]) -> Result<()> {
        let payload = Payload { findings };

        if self.dry_run {
            let body = serde_json::to_string(&payload)?;
            tracing::info!(
                url = %self.url,
                count = findings.len(),
                "[DRY-RUN] Would POST findings: {}",
                body
            );
            return Ok(());
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(count = findings.len(), %status, "Findings delivered");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 | 403 => Error::notifier(
                NOTIFIER_NAME,
                format!("Authentication failed: invalid token. Status: {}", status),
            ),
            429 => Error::notifier(
                NOTIFIER_NAME,
                format!("Rate limit exceeded. Status: {}", status),
            ),
            500..=599 => Error::notifier(
                NOTIFIER_NAME,
                format!("Endpoint server error (transient): {} - {}", status, body),
            ),
            _ => Error::notifier(
                NOTIFIER_NAME,
                format!("Delivery rejected: {} - {}", status, body),
            ),
        })
    }

    fn notifier_name(&self) -> &'static str {
        NOTIFIER_NAME
    }
}

/// Factory for creating webhook notifiers
///
/// `SQUATWATCH_MODE=dry-run` forces dry-run regardless of the config.
pub struct WebhookNotifierFactory;

impl NotifierFactory for WebhookNotifierFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        match config {
            NotifierConfig::Webhook {
                url,
                token,
                dry_run,
            } => {
                let dry_run = *dry_run
                    || std::env::var("SQUATWATCH_MODE")
                        .unwrap_or_default()
                        .eq_ignore_ascii_case("dry-run");

                if dry_run {
                    tracing::warn!("Webhook notifier running in DRY-RUN mode - nothing will be sent");
                }

                Ok(Box::new(WebhookNotifier::new(url.clone(), token.clone(), dry_run)?))
            }
            _ => Err(Error::config("Invalid config for webhook notifier")),
        }
    }
}

/// Register the webhook notifier with a registry
///
/// # Example
///
/// ```rust
/// use squatwatch_core::PluginRegistry;
///
/// let registry = PluginRegistry::with_builtins();
/// squatwatch_notify_webhook::register(&registry);
/// assert!(registry.has_notifier("webhook"));
/// ```
pub fn register(registry: &PluginRegistry) {
    registry.register_notifier(NOTIFIER_NAME, Box::new(WebhookNotifierFactory));
}
