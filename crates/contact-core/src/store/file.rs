// # File Record Store
//
// File-based implementation of RecordSource and RecordSink with crash recovery.
//
// ## Purpose
//
// Persists contact records across restarts, for the command-line driver
// and for local development against a fixture file.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good contents
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": {
//     "003000000000001": {
//       "email": "a@b.com",
//       "phone": null,
//       "do_not_call": true,
//       "email_opt_out": false,
//       "last_modified": "2025-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{RwLock, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use super::StoredContact;
use crate::Error;
use crate::model::{ContactSnapshot, FieldMap};
use crate::traits::{RecordSink, RecordSource, RecordUpdate};

/// Records file format version
/// Used for future migration if format changes
const RECORDS_FILE_VERSION: &str = "1.0";

/// Buffered updates per watcher before the oldest are dropped
const UPDATE_BUFFER: usize = 64;

/// File-based record store with crash recovery
///
/// This implementation persists records to a JSON file with atomic writes
/// and automatic corruption recovery. Every update is written through
/// immediately.
///
/// # Example
///
/// ```rust,no_run
/// use contact_core::store::FileRecordStore;
/// use contact_core::traits::RecordSource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileRecordStore::new("/var/lib/contacts/records.json").await?;
///
///     let snapshot = store.fetch("003000000000001").await?;
///     println!("do not call: {}", snapshot.do_not_call);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    records: Arc<RwLock<HashMap<String, StoredContact>>>,
    updates: broadcast::Sender<RecordUpdate>,
}

/// Serializable records file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct RecordsFileFormat {
    version: String,
    records: HashMap<String, StoredContact>,
}

impl FileRecordStore {
    /// Create or load a file record store
    ///
    /// This will:
    /// 1. Try to load existing records file
    /// 2. If corruption detected, try to load from backup
    /// 3. If both fail, start with no records
    /// 4. Create parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create records directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let records = Self::load_with_recovery(&path).await?;
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);

        Ok(Self {
            path,
            records: Arc::new(RwLock::new(records)),
            updates,
        })
    }

    /// Insert or replace a record, writing it through to disk
    pub async fn insert(
        &self,
        record_id: impl Into<String>,
        snapshot: ContactSnapshot,
    ) -> Result<(), Error> {
        let record_id = record_id.into();
        {
            let mut guard = self.records.write().await;
            guard.insert(record_id.clone(), StoredContact::from_snapshot(&snapshot));
        }
        self.write_records().await?;
        self.publish(&record_id).await;
        Ok(())
    }

    /// Get the stored form of a record
    pub async fn get(&self, record_id: &str) -> Option<StoredContact> {
        self.records.read().await.get(record_id).cloned()
    }

    /// List all record ids in the store
    pub async fn list_records(&self) -> Vec<String> {
        self.records.read().await.keys().cloned().collect()
    }

    /// Load records from file with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load main records file
    /// 2. If JSON parse error, try loading backup
    /// 3. If backup also fails, start with no records
    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, StoredContact>, Error> {
        let parse_error = match Self::load_records(path).await {
            Ok(records) => {
                tracing::debug!("Loaded records file: {} records", records.len());
                return Ok(records);
            }
            Err(Error::Json(e)) => e,
            // Other error (not corruption)
            Err(e) => return Err(e),
        };

        tracing::warn!(
            "Records file {} appears corrupted: {}. Attempting recovery from backup.",
            path.display(),
            parse_error
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with no records.");
            return Ok(HashMap::new());
        }

        match Self::load_records(&backup_path).await {
            Ok(records) => {
                tracing::info!("Recovered records from backup: {} records", records.len());

                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!("Failed to restore records file from backup: {}", restore_err);
                }

                Ok(records)
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also corrupted: {}. Starting with no records.",
                    backup_err
                );
                Ok(HashMap::new())
            }
        }
    }

    /// Load records from file
    ///
    /// Parse failures are returned as [`Error::Json`] so callers can tell
    /// corruption apart from I/O failures.
    async fn load_records(path: &Path) -> Result<HashMap<String, StoredContact>, Error> {
        if !path.exists() {
            tracing::debug!("Records file does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!(
                "Failed to read records file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: RecordsFileFormat = serde_json::from_str(&content)?;

        if file.version != RECORDS_FILE_VERSION {
            tracing::warn!(
                "Records file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                RECORDS_FILE_VERSION,
                file.version
            );
        }

        Ok(file.records)
    }

    /// Write records to file atomically
    async fn write_records(&self) -> Result<(), Error> {
        let file = {
            let guard = self.records.read().await;
            RecordsFileFormat {
                version: RECORDS_FILE_VERSION.to_string(),
                records: guard.clone(),
            }
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::store(format!("Failed to serialize records: {}", e)))?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut handle = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            handle.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            handle.flush().await.map_err(|e| {
                Error::store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous contents as backup
        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Records written to file: {}", self.path.display());
        Ok(())
    }

    async fn publish(&self, record_id: &str) {
        let snapshot = match self.records.read().await.get(record_id) {
            Some(record) => record.snapshot(),
            None => return,
        };
        let _ = self.updates.send(RecordUpdate::new(record_id, snapshot));
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl RecordSource for FileRecordStore {
    async fn fetch(&self, record_id: &str) -> Result<ContactSnapshot, Error> {
        let guard = self.records.read().await;
        guard
            .get(record_id)
            .map(StoredContact::snapshot)
            .ok_or_else(|| Error::not_found(record_id))
    }

    fn watch(&self, record_id: &str) -> Pin<Box<dyn Stream<Item = RecordUpdate> + Send + 'static>> {
        let record_id = record_id.to_string();
        let stream =
            BroadcastStream::new(self.updates.subscribe()).filter_map(move |item| match item {
                Ok(update) if update.record_id == record_id => Some(update),
                _ => None,
            });
        Box::pin(stream)
    }
}

#[async_trait]
impl RecordSink for FileRecordStore {
    async fn update(&self, fields: &FieldMap) -> Result<(), Error> {
        let previous = {
            let mut guard = self.records.write().await;
            let record = guard
                .get_mut(&fields.id)
                .ok_or_else(|| Error::not_found(fields.id.clone()))?;
            std::mem::replace(record, StoredContact::from_fields(fields))
        };

        // Immediate write for durability; keep memory in step with disk
        if let Err(e) = self.write_records().await {
            let mut guard = self.records.write().await;
            guard.insert(fields.id.clone(), previous);
            return Err(e);
        }

        self.publish(&fields.id).await;
        Ok(())
    }
}
