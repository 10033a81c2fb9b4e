//! Built-in notifier
//!
//! [`LogNotifier`] reports each finding as a structured `tracing` event. It
//! is the default sink when no external notifier is configured.

use async_trait::async_trait;
use tracing::info;

use crate::Error;
use crate::config::NotifierConfig;
use crate::traits::{Finding, Notifier, NotifierFactory};

/// Notifier that logs findings
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, findings: &[Finding]) -> Result<(), Error> {
        for finding in findings {
            info!(
                original_domain = %finding.original_domain,
                detected_domain = %finding.detected_domain,
                client_code = %finding.client_code,
                raw_data = %finding.raw_data,
                "New typosquatting candidate"
            );
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "log"
    }
}

/// Factory for `NotifierConfig::Log`
pub struct LogNotifierFactory;

impl NotifierFactory for LogNotifierFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>, Error> {
        match config {
            NotifierConfig::Log => Ok(Box::new(LogNotifier::new())),
            other => Err(Error::config(format!(
                "Log notifier factory cannot build '{}' notifier",
                other.type_name()
            ))),
        }
    }
}
