// # Record Source Trait
//
// Defines the interface for retrieving contact records.
//
// ## Implementations
//
// - In-memory: `MemoryRecordStore`
// - JSON file: `FileRecordStore`
//
// ## Usage
//
// ```rust,ignore
// use contact_core::RecordSource;
// use tokio_stream::StreamExt;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* RecordSource implementation */;
//
//     // Initial snapshot
//     let snapshot = source.fetch("003000000000001").await?;
//
//     // Later changes to the same record
//     let mut updates = source.watch("003000000000001");
//     while let Some(update) = updates.next().await {
//         println!("record changed: {:?}", update.snapshot);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

use crate::model::ContactSnapshot;

/// A record changed at its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// The record that changed
    pub record_id: String,
    /// The record's new contents
    pub snapshot: ContactSnapshot,
}

impl RecordUpdate {
    /// Create a new record update
    pub fn new(record_id: impl Into<String>, snapshot: ContactSnapshot) -> Self {
        Self {
            record_id: record_id.into(),
            snapshot,
        }
    }
}

/// Trait for record source implementations
///
/// A record source delivers the snapshot the editor seeds its baseline from.
/// It performs retrieval only: it never decides whether a refresh should be
/// applied, and it never sees the editor's working state.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the current contents of a record
    ///
    /// # Returns
    ///
    /// - `Ok(ContactSnapshot)`: The record's fields, with absent email or
    ///   phone values read as `""`
    /// - `Err(Error)`: The record is missing or the source failed
    async fn fetch(&self, record_id: &str) -> Result<ContactSnapshot, crate::Error>;

    /// Stream of changes to a record after this call
    ///
    /// The stream ends when the source is dropped.
    fn watch(&self, record_id: &str) -> Pin<Box<dyn Stream<Item = RecordUpdate> + Send + 'static>>;
}
