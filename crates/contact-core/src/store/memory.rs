// # Memory Record Store
//
// In-memory implementation of RecordSource and RecordSink.
//
// ## Purpose
//
// Provides a simple, fast record store that doesn't persist across restarts.
// Useful for testing and for embedding the editor in front of a record
// system that is synchronized elsewhere.
//
// ## Change Notification
//
// Every successful write is broadcast to watchers of that record. Slow
// watchers that fall behind the broadcast buffer lose the oldest updates
// (logged).

use async_trait::async_trait;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use super::StoredContact;
use crate::Error;
use crate::model::{ContactSnapshot, FieldMap};
use crate::traits::{RecordSink, RecordSource, RecordUpdate};

/// Buffered updates per watcher before the oldest are dropped
const UPDATE_BUFFER: usize = 64;

/// In-memory record store implementation
///
/// This implementation stores all records in a HashMap protected by a RwLock.
/// It provides no persistence across restarts.
///
/// # Example
///
/// ```rust,no_run
/// use contact_core::model::ContactSnapshot;
/// use contact_core::store::MemoryRecordStore;
/// use contact_core::traits::RecordSource;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new();
///
///     store
///         .insert("003000000000001", ContactSnapshot::new("a@b.com", "", false, false))
///         .await;
///
///     let snapshot = store.fetch("003000000000001").await?;
///     assert_eq!(snapshot.email, "a@b.com");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<HashMap<String, StoredContact>>>,
    updates: broadcast::Sender<RecordUpdate>,
}

impl MemoryRecordStore {
    /// Create a new empty memory record store
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            updates,
        }
    }

    /// Insert or replace a record and notify watchers
    pub async fn insert(&self, record_id: impl Into<String>, snapshot: ContactSnapshot) {
        let record_id = record_id.into();
        {
            let mut guard = self.inner.write().await;
            guard.insert(record_id.clone(), StoredContact::from_snapshot(&snapshot));
        }
        self.publish(&record_id).await;
    }

    /// Get the stored form of a record
    pub async fn get(&self, record_id: &str) -> Option<StoredContact> {
        self.inner.read().await.get(record_id).cloned()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    async fn publish(&self, record_id: &str) {
        let snapshot = match self.inner.read().await.get(record_id) {
            Some(record) => record.snapshot(),
            None => return,
        };
        // No receivers is not an error
        let _ = self.updates.send(RecordUpdate::new(record_id, snapshot));
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordSource for MemoryRecordStore {
    async fn fetch(&self, record_id: &str) -> Result<ContactSnapshot, Error> {
        let guard = self.inner.read().await;
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
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Record watcher for {} fell behind: {}", record_id, e);
                    None
                }
            });
        Box::pin(stream)
    }
}

#[async_trait]
impl RecordSink for MemoryRecordStore {
    async fn update(&self, fields: &FieldMap) -> Result<(), Error> {
        {
            let mut guard = self.inner.write().await;
            let record = guard
                .get_mut(&fields.id)
                .ok_or_else(|| Error::not_found(fields.id.clone()))?;
            *record = StoredContact::from_fields(fields);
        }
        self.publish(&fields.id).await;
        Ok(())
    }
}
