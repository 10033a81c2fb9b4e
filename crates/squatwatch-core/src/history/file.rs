// # File History Store
//
// File-based implementation of HistoryStore, one JSON document per client.
//
// ## Crash Recovery
//
// - Atomic writes: write to `<client>.tmp`, then rename over `<client>.json`
// - Backup: the previous document is copied to `<client>.backup` first
// - Corruption: a main file that fails to parse is replaced by its backup
// - No silent reset: if neither file parses, loading fails with
//   `Error::HistoryLoad` instead of returning an empty history
//
// A recovered backup may lack the most recent record. That variant will be
// reported again on the next run, which is preferred over losing it.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "client_id": "ABC0",
//   "records": {
//     "examp1e.com": {
//       "DomainName": "examp1e.com",
//       "OriginalDomain": "example.com",
//       "Fuzzer": "homoglyph",
//       "ClientID": "ABC0",
//       "RawPayload": "{...}",
//       "DiscoveredAt": "2026-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, hash_map::Entry};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::HistoryStoreConfig;
use crate::traits::history_store::{HistoryRecord, HistoryStore, HistoryStoreFactory};

/// History file format version
const HISTORY_FILE_VERSION: &str = "1.0";

type ClientRecords = BTreeMap<String, HistoryRecord>;

/// Serializable history file format
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFileFormat {
    version: String,
    client_id: String,
    records: ClientRecords,
}

/// Why a history file could not be loaded
enum LoadFailure {
    /// File exists but is not a valid history document
    Corrupt(String),
    /// File could not be read at all
    Unreadable(String),
}

/// File-based history store
///
/// Each client's history is loaded lazily on first access and cached for
/// the lifetime of the store. Every `put` rewrites the client's file before
/// returning.
///
/// # Example
///
/// ```rust,no_run
/// use squatwatch_core::history::FileHistoryStore;
/// use squatwatch_core::traits::HistoryStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileHistoryStore::new("/var/lib/squatwatch/history");
///     let known = store.scan_all("ABC0").await?;
///     println!("{} known variants", known.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileHistoryStore {
    dir: PathBuf,
    clients: Mutex<HashMap<String, ClientRecords>>,
}

impl FileHistoryStore {
    /// Create a store rooted at `dir`
    ///
    /// The directory is created on first write.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Directory holding the history files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a client's history file
    pub fn client_path(&self, client_id: &str) -> Result<PathBuf, Error> {
        let safe = !client_id.is_empty()
            && client_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(Error::invalid_input(format!(
                "Client id '{}' cannot be used as a history file name",
                client_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", client_id)))
    }

    /// Load a client's records, falling back to the backup on corruption
    async fn load_with_recovery(path: &Path, client_id: &str) -> Result<ClientRecords, Error> {
        let failure = match Self::load_file(path).await {
            Ok(records) => {
                tracing::debug!(
                    "Loaded history for {}: {} records",
                    client_id,
                    records.len()
                );
                return Ok(records);
            }
            Err(LoadFailure::Unreadable(e)) => {
                return Err(Error::history_load(client_id, e));
            }
            Err(LoadFailure::Corrupt(e)) => e,
        };

        tracing::warn!(
            "History file for {} appears corrupted: {}. Attempting recovery from backup.",
            client_id,
            failure
        );

        let backup_path = Self::backup_path(path);
        if !fs::try_exists(&backup_path).await.unwrap_or(false) {
            tracing::error!("No history backup for {}", client_id);
            return Err(Error::history_load(
                client_id,
                format!("{} (no backup available)", failure),
            ));
        }

        match Self::load_file(&backup_path).await {
            Ok(records) => {
                tracing::info!(
                    "Recovered history for {} from backup: {} records",
                    client_id,
                    records.len()
                );
                if let Err(e) = fs::copy(&backup_path, path).await {
                    tracing::error!("Failed to restore history file from backup: {}", e);
                }
                Ok(records)
            }
            Err(LoadFailure::Corrupt(e)) | Err(LoadFailure::Unreadable(e)) => {
                tracing::error!("History backup for {} also unusable: {}", client_id, e);
                Err(Error::history_load(
                    client_id,
                    format!("{}; backup: {}", failure, e),
                ))
            }
        }
    }

    /// Load one history document; a missing file is an empty history
    async fn load_file(path: &Path) -> Result<ClientRecords, LoadFailure> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("History file does not exist: {}", path.display());
                return Ok(ClientRecords::new());
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(LoadFailure::Corrupt(format!(
                    "{} is not valid UTF-8",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(LoadFailure::Unreadable(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let file: HistoryFileFormat = serde_json::from_str(&content).map_err(|e| {
            LoadFailure::Corrupt(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        if file.version != HISTORY_FILE_VERSION {
            tracing::warn!(
                "History file version mismatch: expected {}, got {}. Attempting to load anyway.",
                HISTORY_FILE_VERSION,
                file.version
            );
        }

        Ok(file.records)
    }

    /// Write a client's records atomically
    async fn write_file(
        &self,
        path: &Path,
        client_id: &str,
        records: &ClientRecords,
    ) -> Result<(), String> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            format!(
                "Failed to create history directory {}: {}",
                self.dir.display(),
                e
            )
        })?;

        let document = HistoryFileFormat {
            version: HISTORY_FILE_VERSION.to_string(),
            client_id: client_id.to_string(),
            records: records.clone(),
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| format!("Failed to serialize history: {}", e))?;

        let temp_path = Self::temp_path(path);
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                format!("Failed to create temp file {}: {}", temp_path.display(), e)
            })?;
            file.write_all(json.as_bytes())
                .await
                .map_err(|e| format!("Failed to write {}: {}", temp_path.display(), e))?;
            file.sync_all()
                .await
                .map_err(|e| format!("Failed to sync {}: {}", temp_path.display(), e))?;
        }

        if fs::try_exists(path).await.unwrap_or(false) {
            if let Err(e) = fs::copy(path, Self::backup_path(path)).await {
                tracing::warn!("Failed to create history backup: {}", e);
            }
        }

        fs::rename(&temp_path, path).await.map_err(|e| {
            format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )
        })?;

        tracing::trace!("History written to {}", path.display());
        Ok(())
    }

    fn temp_path(path: &Path) -> PathBuf {
        path.with_extension("tmp")
    }

    fn backup_path(path: &Path) -> PathBuf {
        path.with_extension("backup")
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn scan_all(&self, client_id: &str) -> Result<Vec<HistoryRecord>, Error> {
        let path = self
            .client_path(client_id)
            .map_err(|e| Error::history_load(client_id, e.to_string()))?;

        let mut clients = self.clients.lock().await;
        let records = match clients.entry(client_id.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Self::load_with_recovery(&path, client_id).await?),
        };
        Ok(records.values().cloned().collect())
    }

    async fn put(&self, record: &HistoryRecord) -> Result<(), Error> {
        let client_id = record.client_id.as_str();
        let domain = record.domain_name.as_str();
        let path = self
            .client_path(client_id)
            .map_err(|e| Error::persistence(domain, e.to_string()))?;

        let mut clients = self.clients.lock().await;
        let records = match clients.entry(client_id.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let loaded = Self::load_with_recovery(&path, client_id)
                    .await
                    .map_err(|e| Error::persistence(domain, e.to_string()))?;
                entry.insert(loaded)
            }
        };

        if records.contains_key(domain) {
            return Ok(());
        }

        records.insert(domain.to_string(), record.clone());
        if let Err(e) = self.write_file(&path, client_id, records).await {
            records.remove(domain);
            return Err(Error::persistence(domain, e));
        }
        Ok(())
    }

    async fn contains(&self, client_id: &str, domain_name: &str) -> Result<bool, Error> {
        let records = self.scan_all(client_id).await?;
        Ok(records.iter().any(|r| r.domain_name == domain_name))
    }
}

/// Factory for `HistoryStoreConfig::File`
pub struct FileHistoryStoreFactory;

impl HistoryStoreFactory for FileHistoryStoreFactory {
    fn create(&self, config: &HistoryStoreConfig) -> Result<Box<dyn HistoryStore>, Error> {
        match config {
            HistoryStoreConfig::File { dir } => Ok(Box::new(FileHistoryStore::new(dir))),
            other => Err(Error::config(format!(
                "File history factory cannot build '{}' store",
                other.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::DomainVariant;
    use tempfile::tempdir;

    fn record(domain: &str) -> HistoryRecord {
        HistoryRecord::new(&DomainVariant::new("test", domain), "example.com", "ABC0")
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempdir().unwrap();

        let store = FileHistoryStore::new(dir.path());
        assert!(store.scan_all("ABC0").await.unwrap().is_empty());
        store.put(&record("examp1e.com")).await.unwrap();
        assert!(dir.path().join("ABC0.json").exists());

        let reopened = FileHistoryStore::new(dir.path());
        let records = reopened.scan_all("ABC0").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].domain_name, "examp1e.com");
        assert!(reopened.scan_all("XYZ9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_record_is_not_rewritten() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path());

        let first = record("examp1e.com");
        store.put(&first).await.unwrap();
        let mut again = record("examp1e.com");
        again.fuzzer = "replacement".to_string();
        store.put(&again).await.unwrap();

        let reopened = FileHistoryStore::new(dir.path());
        assert_eq!(reopened.scan_all("ABC0").await.unwrap(), vec![first]);
    }

    #[tokio::test]
    async fn test_corruption_recovers_from_backup() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path());
        store.put(&record("examp1e.com")).await.unwrap();
        store.put(&record("exampl.com")).await.unwrap();

        let path = store.client_path("ABC0").unwrap();
        assert!(FileHistoryStore::backup_path(&path).exists());
        fs::write(&path, b"corrupted json data").await.unwrap();

        let reopened = FileHistoryStore::new(dir.path());
        let records = reopened.scan_all("ABC0").await.unwrap();
        // the backup predates the last write
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].domain_name, "examp1e.com");
    }

    #[tokio::test]
    async fn test_unrecoverable_history_is_an_error() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path());
        let path = store.client_path("ABC0").unwrap();

        fs::write(&path, b"{not json").await.unwrap();
        fs::write(FileHistoryStore::backup_path(&path), b"{not json either")
            .await
            .unwrap();

        let result = store.scan_all("ABC0").await;
        assert!(matches!(result, Err(Error::HistoryLoad { .. })));
        assert!(result.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_rejects_path_like_client_ids() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path());

        assert!(store.scan_all("../etc").await.is_err());

        let mut bad = record("examp1e.com");
        bad.client_id = "a/b".to_string();
        assert!(matches!(
            store.put(&bad).await,
            Err(Error::Persistence { .. })
        ));
    }
}
