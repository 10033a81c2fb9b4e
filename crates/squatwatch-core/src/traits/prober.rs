// # Prober Trait
//
// Defines the interface for looking up live DNS/WHOIS presence of a single
// candidate domain.
//
// ## Implementations
//
// - DNS (hickory) + WHOIS: `squatwatch-probe-dns` crate
//
// ## Usage
//
// ```rust,ignore
// use squatwatch_core::Prober;
//
// let records = prober.probe(&variant).await?;
// variant.apply(records);
// ```

use async_trait::async_trait;

use crate::variant::{DomainVariant, ProbeRecords};

/// Trait for prober implementations
///
/// A prober is shared by every worker of a `ProbePool`, so it must be
/// `Send + Sync` and hold no per-candidate state.
///
/// # Contract
///
/// - One call per candidate. The pool never retries.
/// - Bound every lookup with a timeout; a hung probe holds a worker.
/// - "No records" is `Ok(ProbeRecords::default())`, not an error.
/// - Return `Err(Error::Probe)` only when the lookups themselves failed.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Look up records for a candidate
    async fn probe(&self, variant: &DomainVariant) -> Result<ProbeRecords, crate::Error>;

    /// Get the prober name (for logging/debugging)
    fn prober_name(&self) -> &'static str;
}

/// Helper trait for constructing probers from configuration
pub trait ProberFactory: Send + Sync {
    /// Create a Prober instance from configuration
    fn create(
        &self,
        config: &crate::config::ProbeConfig,
    ) -> Result<std::sync::Arc<dyn Prober>, crate::Error>;
}
