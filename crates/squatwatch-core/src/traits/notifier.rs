// # Notifier Trait
//
// Defines the interface for delivering a Finding Batch to whatever creates
// tickets or alerts downstream.
//
// ## Implementations
//
// - Log: `LogNotifier` (built in)
// - Webhook: `squatwatch-notify-webhook` crate
//
// ## Usage
//
// ```rust,ignore
// use squatwatch_core::Notifier;
//
// notifier.notify(&findings).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::variant::DomainVariant;

/// One novel variant, as handed to the notifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Finding {
    /// The monitored root domain
    pub original_domain: String,
    /// The novel variant
    pub detected_domain: String,
    /// Client identity
    pub client_code: String,
    /// JSON of the probed variant
    pub raw_data: serde_json::Value,
}

impl Finding {
    /// Build a finding from a probed variant
    pub fn new(
        variant: &DomainVariant,
        original_domain: impl Into<String>,
        client_code: impl Into<String>,
    ) -> Self {
        Self {
            original_domain: original_domain.into(),
            detected_domain: variant.domain_name.clone(),
            client_code: client_code.into(),
            raw_data: variant.to_json(),
        }
    }
}

/// Trait for notifier implementations
///
/// # Trust Level: Untrusted
///
/// Notifiers are external integrations. The engine treats them as
/// fire-and-forget: an error is logged and the run carries on.
///
/// ## Allowed Capabilities
/// - ✅ Perform API calls to their own endpoint
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (a failed batch is re-sent on a later run at most)
/// - ❌ Access the history store
/// - ❌ Spawn tasks that outlive `notify`
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a batch of findings
    ///
    /// The engine never calls this with an empty batch.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Batch accepted by the sink
    /// - `Err(Error::Notifier)`: Delivery failed
    async fn notify(&self, findings: &[Finding]) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}

/// Helper trait for constructing notifiers from configuration
pub trait NotifierFactory: Send + Sync {
    /// Create a Notifier instance from configuration
    fn create(
        &self,
        config: &crate::config::NotifierConfig,
    ) -> Result<Box<dyn Notifier>, crate::Error>;
}
