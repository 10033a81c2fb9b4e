// # Memory History Store
//
// In-memory implementation of HistoryStore.
//
// ## Crash Behavior
//
// - All history is lost on restart
// - The first run after a restart reports every hit as novel
//
// ## When to Use
//
// - Tests and local runs
// - Embedding the monitor where another layer owns persistence

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::HistoryStoreConfig;
use crate::traits::history_store::{HistoryRecord, HistoryStore, HistoryStoreFactory};

/// In-memory history store
///
/// Records are kept per client in a map keyed by domain name. Clones share
/// the same underlying map.
///
/// # Example
///
/// ```rust,no_run
/// use squatwatch_core::history::MemoryHistoryStore;
/// use squatwatch_core::traits::{HistoryRecord, HistoryStore};
/// use squatwatch_core::variant::DomainVariant;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryHistoryStore::new();
///     let variant = DomainVariant::new("homoglyph", "examp1e.com");
///
///     store.put(&HistoryRecord::new(&variant, "example.com", "ABC0")).await?;
///     assert!(store.contains("ABC0", "examp1e.com").await?);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    inner: Arc<RwLock<HashMap<String, HashMap<String, HistoryRecord>>>>,
}

impl MemoryHistoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for a client
    pub async fn len(&self, client_id: &str) -> usize {
        self.inner
            .read()
            .await
            .get(client_id)
            .map_or(0, HashMap::len)
    }

    /// Check if a client has no history
    pub async fn is_empty(&self, client_id: &str) -> bool {
        self.len(client_id).await == 0
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn scan_all(&self, client_id: &str) -> Result<Vec<HistoryRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .get(client_id)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put(&self, record: &HistoryRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard
            .entry(record.client_id.clone())
            .or_default()
            .entry(record.domain_name.clone())
            .or_insert_with(|| record.clone());
        Ok(())
    }

    async fn contains(&self, client_id: &str, domain_name: &str) -> Result<bool, Error> {
        let guard = self.inner.read().await;
        Ok(guard
            .get(client_id)
            .is_some_and(|records| records.contains_key(domain_name)))
    }
}

/// Factory for `HistoryStoreConfig::Memory`
pub struct MemoryHistoryStoreFactory;

impl HistoryStoreFactory for MemoryHistoryStoreFactory {
    fn create(&self, config: &HistoryStoreConfig) -> Result<Box<dyn HistoryStore>, Error> {
        match config {
            HistoryStoreConfig::Memory => Ok(Box::new(MemoryHistoryStore::new())),
            other => Err(Error::config(format!(
                "Memory history factory cannot build '{}' store",
                other.type_name()
            ))),
        }
    }
}
