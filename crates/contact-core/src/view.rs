//! Read-only surfaces for a UI layer
//!
//! - [`EditorView`]: everything an edit form renders
//! - [`FlagsReader`]: a display-only reader of a record's suppression flags

use serde::Serialize;
use tracing::warn;

use crate::error::Error;
use crate::model::ContactSnapshot;
use crate::traits::RecordSource;

/// Rendered state of a [`FieldSuppressionEditor`](crate::FieldSuppressionEditor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorView {
    pub email: String,
    pub phone: String,
    pub do_not_call: bool,
    pub email_opt_out: bool,
    /// A load result (data or error) has been received
    pub loaded: bool,
    /// The working copy differs from the baseline
    pub can_save: bool,
    /// A save is waiting on the record sink
    pub saving: bool,
    /// Whether the editor should be shown at all
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

impl EditorView {
    pub(crate) fn new(
        working: &ContactSnapshot,
        loaded: bool,
        can_save: bool,
        saving: bool,
        hide_when_suppressed: bool,
        load_error: Option<String>,
    ) -> Self {
        Self {
            email: working.email.clone(),
            phone: working.phone.clone(),
            do_not_call: working.do_not_call,
            email_opt_out: working.email_opt_out,
            loaded,
            can_save,
            saving,
            visible: loaded && !(hide_when_suppressed && working.any_suppressed()),
            load_error,
        }
    }
}

/// Display-only view of a record's suppression flags
///
/// Flags read as `false` until data arrives. `loaded()` turns true on the
/// first result of either kind.
#[derive(Debug, Clone, Default)]
pub struct FlagsReader {
    data: Option<ContactSnapshot>,
    error: Option<String>,
}

impl FlagsReader {
    /// Create a reader with no data
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the outcome of fetching the record
    ///
    /// A failure after earlier data keeps that data.
    pub fn on_load_result(&mut self, result: Result<ContactSnapshot, Error>) {
        match result {
            Ok(snapshot) => {
                self.data = Some(snapshot);
                self.error = None;
            }
            Err(e) => {
                warn!("Failed to read contact flags: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }

    /// Fetch the record from `source` and deliver the outcome
    pub async fn refresh(&mut self, source: &dyn RecordSource, record_id: &str) {
        let result = source.fetch(record_id).await;
        self.on_load_result(result);
    }

    pub fn do_not_call(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.do_not_call)
    }

    pub fn email_opt_out(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.email_opt_out)
    }

    pub fn loaded(&self) -> bool {
        self.data.is_some() || self.error.is_some()
    }

    /// Detail of the most recent failure
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
