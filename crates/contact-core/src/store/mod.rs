// # Record Store Implementations
//
// Reference implementations of RecordSource and RecordSink for different
// persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ContactSnapshot, FieldMap};

/// A contact record as held by a store
///
/// Email and phone are optional: a cleared field is stored as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContact {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub do_not_call: bool,
    #[serde(default)]
    pub email_opt_out: bool,
    /// Timestamp of the last write
    pub last_modified: DateTime<Utc>,
}

impl StoredContact {
    /// Create a record from a snapshot, storing empty values as absent
    pub fn from_snapshot(snapshot: &ContactSnapshot) -> Self {
        Self::from_fields(&FieldMap::from_snapshot("", snapshot))
    }

    /// Create a record from a save payload
    pub(crate) fn from_fields(fields: &FieldMap) -> Self {
        Self {
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            do_not_call: fields.do_not_call,
            email_opt_out: fields.email_opt_out,
            last_modified: Utc::now(),
        }
    }

    /// The record as the editor sees it, absent values read as `""`
    pub fn snapshot(&self) -> ContactSnapshot {
        ContactSnapshot {
            email: self.email.clone().unwrap_or_default(),
            phone: self.phone.clone().unwrap_or_default(),
            do_not_call: self.do_not_call,
            email_opt_out: self.email_opt_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_read_as_empty() {
        let stored: StoredContact = serde_json::from_str(
            r#"{"email": null, "do_not_call": true, "last_modified": "2025-01-09T12:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(stored.snapshot(), ContactSnapshot::new("", "", true, false));
    }

    #[test]
    fn empty_values_stored_as_absent() {
        let stored =
            StoredContact::from_snapshot(&ContactSnapshot::new("a@b.com", "", true, false));
        assert_eq!(stored.email.as_deref(), Some("a@b.com"));
        assert_eq!(stored.phone, None);
    }
}
