// # Record Sink Trait
//
// Defines the interface for persisting contact records.
//
// ## Implementations
//
// - In-memory: `MemoryRecordStore`
// - JSON file: `FileRecordStore`

use async_trait::async_trait;

use crate::model::FieldMap;

/// Trait for record sink implementations
///
/// A sink executes exactly one write per call and reports the outcome. It
/// must not retry: retry is a user action driven through the editor, and a
/// timeout, if any, is the sink's own responsibility.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Persist the fields of one record
    ///
    /// `None` for email or phone means the field is cleared.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The record was written
    /// - `Err(Error)`: The write was rejected; the message is shown to the user
    async fn update(&self, fields: &FieldMap) -> Result<(), crate::Error>;
}
