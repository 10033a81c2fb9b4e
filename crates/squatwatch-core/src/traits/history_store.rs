// # History Store Trait
//
// Defines the interface for the durable, per-client record of every variant
// ever confirmed novel.
//
// ## Purpose
//
// The history store is what makes a run's findings *novel*: a variant is only
// reported if no record for (client, domain-name) exists yet.
//
// ## Implementations
//
// - Memory: `MemoryHistoryStore` (tests, local runs)
// - File: `FileHistoryStore`, one JSON file per client
// - Future: key-value / document databases
//
// ## Usage
//
// ```rust,ignore
// use squatwatch_core::HistoryStore;
//
// let records = store.scan_all("ABC0").await?;
// store.put(&HistoryRecord::new(&variant, "example.com", "ABC0")).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::variant::DomainVariant;

/// One ever-seen variant for one client
///
/// Keyed by (`client_id`, `domain_name`). Records are append-only: nothing
/// in this crate updates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoryRecord {
    /// The variant domain
    pub domain_name: String,
    /// The monitored root domain
    pub original_domain: String,
    /// Rule that produced the variant
    pub fuzzer: String,
    /// Client identity
    #[serde(rename = "ClientID")]
    pub client_id: String,
    /// JSON of the probed variant
    pub raw_payload: String,
    /// When the variant was first confirmed novel
    pub discovered_at: chrono::DateTime<chrono::Utc>,
}

impl HistoryRecord {
    /// Build the record for a newly novel variant
    pub fn new(
        variant: &DomainVariant,
        original_domain: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            domain_name: variant.domain_name.clone(),
            original_domain: original_domain.into(),
            fuzzer: variant.fuzzer.clone(),
            client_id: client_id.into(),
            raw_payload: variant.to_json().to_string(),
            discovered_at: chrono::Utc::now(),
        }
    }
}

/// Trait for history store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Contract
///
/// - `scan_all` returns every record for the client, or fails. A store that
///   cannot read its data must return an error instead of an empty list,
///   otherwise every known variant would be re-reported.
/// - `put` appends one record. Writing a key that already exists must leave
///   the existing record untouched.
/// - Writes are independent: there is no cross-record transaction.
///
/// # Forbidden
///
/// - ❌ Deleting or rewriting existing records
/// - ❌ Deciding novelty (owned by `NoveltyDiffer`)
/// - ❌ Notifying (owned by `Notifier`)
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Read every record for a client
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<HistoryRecord>)`: All records (possibly empty)
    /// - `Err(Error::HistoryLoad)`: History could not be read
    async fn scan_all(&self, client_id: &str) -> Result<Vec<HistoryRecord>, crate::Error>;

    /// Append one record
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Record durably written (or already present)
    /// - `Err(Error::Persistence)`: Write failed
    async fn put(&self, record: &HistoryRecord) -> Result<(), crate::Error>;

    /// Point lookup for a single domain
    ///
    /// The default implementation scans the whole client history. Stores
    /// with an index should override it.
    async fn contains(&self, client_id: &str, domain_name: &str) -> Result<bool, crate::Error> {
        let records = self.scan_all(client_id).await?;
        Ok(records.iter().any(|r| r.domain_name == domain_name))
    }

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error> {
        Ok(())
    }
}

/// Helper trait for constructing history stores from configuration
pub trait HistoryStoreFactory: Send + Sync {
    /// Create a HistoryStore instance from configuration
    fn create(
        &self,
        config: &crate::config::HistoryStoreConfig,
    ) -> Result<Box<dyn HistoryStore>, crate::Error>;
}
