//! Field-suppression editor
//!
//! The FieldSuppressionEditor is responsible for:
//! - Seeding the baseline and working copy from a loaded snapshot
//! - Keeping email/phone consistent with the suppression flags
//! - Gating save on a dirty working copy
//! - Committing the baseline after a successful save
//!
//! ## Architecture
//!
//! ```text
//!   load result ──┐        edits / toggles          save / reset
//!                 ▼               │                      │
//!        ┌─────────────────────────────────────────────────────┐
//!        │               FieldSuppressionEditor                │
//!        │  ┌──────────────┐ ┌──────────────┐ ┌─────────────┐  │
//!        │  │ Baseline     │ │ Suppression  │ │ Working     │  │
//!        │  │ Tracker      │ │ Engine       │ │ Snapshot    │  │
//!        │  └──────────────┘ └──────────────┘ └─────────────┘  │
//!        └─────────────────────────────────────────────────────┘
//!                 │                  │                  │
//!                 ▼                  ▼                  ▼
//!          ┌────────────┐     ┌────────────┐     ┌────────────┐
//!          │ RecordSink │     │  Notifier  │     │   Events   │
//!          │  (save)    │     │  (toasts)  │     │  (monitor) │
//!          └────────────┘     └────────────┘     └────────────┘
//! ```
//!
//! ## Invariants
//!
//! After every public operation:
//! 1. `do_not_call` set implies `phone` is empty
//! 2. `email_opt_out` set implies `email` is empty
//! 3. `can_save()` is exactly "working copy differs from baseline"

pub mod baseline;
pub mod suppression;

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::model::{ContactSnapshot, Field, FieldMap, Flag};
use crate::traits::{Notification, Notifier, RecordSink, Severity};
use crate::view::EditorView;

pub use baseline::BaselineTracker;
pub use suppression::{EditOutcome, SuppressionEngine, SuppressionMemory, ToggleOutcome};

const LOAD_FAILED_TITLE: &str = "Error loading contact";
const SAVED_TITLE: &str = "Saved";
const SAVED_MESSAGE: &str = "Contact updated successfully.";
const SAVE_FAILED_TITLE: &str = "Save failed";

/// Events emitted by the FieldSuppressionEditor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A snapshot was loaded and seeded
    Loaded {
        record_id: String,
        snapshot: ContactSnapshot,
    },

    /// The record could not be loaded
    LoadFailed { record_id: String, error: String },

    /// A field took a new value
    FieldEdited { field: Field, value: String },

    /// An edit to a suppressed field was dropped
    EditIgnored { field: Field },

    /// A suppression flag changed
    FlagToggled { flag: Flag, value: bool },

    /// A save was handed to the record sink
    SaveStarted { ticket: u64 },

    /// The record sink accepted a save
    SaveSucceeded { ticket: u64 },

    /// The record sink rejected a save
    SaveFailed { ticket: u64, error: String },

    /// A save request was refused before reaching the sink
    SaveRejected { reason: String },

    /// The working copy was restored from the baseline
    Reset,

    /// A record refresh was not applied
    RefreshSkipped { reason: String },
}

/// A save that has been handed out but not yet completed
///
/// Obtained from [`FieldSuppressionEditor::begin_save`] and passed back to
/// [`FieldSuppressionEditor::complete_save`] with the sink's outcome.
#[derive(Debug)]
pub struct SaveTicket {
    id: u64,
    fields: FieldMap,
    submitted: ContactSnapshot,
}

impl SaveTicket {
    /// Ticket number, unique per editor
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Payload to hand to the record sink
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

/// Editor for a contact's email/phone fields and their suppression flags
///
/// ## Lifecycle
///
/// 1. Create with [`FieldSuppressionEditor::new()`]
/// 2. Deliver the record with [`FieldSuppressionEditor::on_load_result()`]
/// 3. Apply user input with `edit_field()` / `toggle_flag()`
/// 4. Persist with [`FieldSuppressionEditor::save()`] or discard with `reset()`
///
/// ## Threading
///
/// The editor has exactly one writer. Operations take `&mut self` and never
/// overlap; saves that must not hold the borrow across the sink call use
/// `begin_save()` / `complete_save()` instead of `save()`.
pub struct FieldSuppressionEditor {
    /// Record being edited
    record_id: String,

    /// Editor configuration
    config: EditorConfig,

    /// Live, user-editable copy
    working: ContactSnapshot,

    /// Last-known-persisted snapshot
    baseline: BaselineTracker,

    /// Suppression rules and restore memory
    suppression: SuppressionEngine,

    /// A load result (data or error) has been received
    loaded: bool,

    /// Detail of the most recent load failure
    load_error: Option<String>,

    /// Ticket of the save currently in flight
    pending_save: Option<u64>,

    /// Next ticket number to hand out
    next_ticket: u64,

    /// User-visible notifications
    notifier: Arc<dyn Notifier>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EditorEvent>,
}

impl FieldSuppressionEditor {
    /// Create a new editor
    ///
    /// # Parameters
    ///
    /// - `record_id`: Id of the record being edited
    /// - `config`: Editor configuration
    /// - `notifier`: Receiver of user-visible messages
    ///
    /// # Returns
    ///
    /// A tuple of (editor, event_receiver) where event_receiver yields editor events
    pub fn new(
        record_id: impl Into<String>,
        config: EditorConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<(Self, mpsc::Receiver<EditorEvent>)> {
        config.validate()?;

        let record_id = record_id.into();
        if record_id.trim().is_empty() {
            return Err(Error::invalid_input("Record id cannot be empty"));
        }

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let editor = Self {
            record_id,
            suppression: SuppressionEngine::new(config.preserve_suppressed_values),
            config,
            working: ContactSnapshot::default(),
            baseline: BaselineTracker::new(),
            loaded: false,
            load_error: None,
            pending_save: None,
            next_ticket: 1,
            notifier,
            event_tx: tx,
        };

        Ok((editor, rx))
    }

    /// Id of the record being edited
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Editor configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current working copy
    pub fn working(&self) -> &ContactSnapshot {
        &self.working
    }

    /// Current baseline
    pub fn baseline(&self) -> &ContactSnapshot {
        self.baseline.baseline()
    }

    /// Current suppression memory
    pub fn memory(&self) -> &SuppressionMemory {
        self.suppression.memory()
    }

    /// Whether a load result (data or error) has been received
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Detail of the most recent load failure, if any
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Whether a save is waiting on the record sink
    pub fn is_save_pending(&self) -> bool {
        self.pending_save.is_some()
    }

    /// Whether the working copy differs from the baseline
    pub fn can_save(&self) -> bool {
        self.baseline.is_dirty(&self.working)
    }

    /// Snapshot of everything a UI renders
    pub fn view(&self) -> EditorView {
        EditorView::new(
            &self.working,
            self.loaded,
            self.can_save(),
            self.is_save_pending(),
            self.config.hide_when_suppressed,
            self.load_error.clone(),
        )
    }

    /// Deliver the outcome of fetching the record
    ///
    /// On success the snapshot becomes the baseline and the working copy,
    /// memory is re-seeded and the working copy normalized. On failure the
    /// error is surfaced and no state other than the load flags changes.
    pub fn on_load_result(&mut self, result: Result<ContactSnapshot>) {
        self.loaded = true;

        match result {
            Ok(snapshot) => {
                self.load_error = None;
                self.baseline.seed(snapshot, &mut self.working);
                self.suppression.seed(self.baseline.baseline());
                self.suppression.normalize(&mut self.working);

                info!("Loaded contact {}", self.record_id);
                if self.can_save() {
                    debug!(
                        "Contact {} loaded with a suppressed field holding a value",
                        self.record_id
                    );
                }

                self.emit_event(EditorEvent::Loaded {
                    record_id: self.record_id.clone(),
                    snapshot: self.baseline.baseline().clone(),
                });
            }
            Err(e) => {
                let message = e.user_message();
                error!("Failed to load contact {}: {}", self.record_id, e);

                self.load_error = Some(message.clone());
                self.notify(LOAD_FAILED_TITLE, message.clone(), Severity::Error);
                self.emit_event(EditorEvent::LoadFailed {
                    record_id: self.record_id.clone(),
                    error: message,
                });
            }
        }
    }

    /// Apply a snapshot pushed by the record source after the initial load
    ///
    /// The refresh is applied only while the editor is clean and no save is
    /// pending, so it never overwrites unsaved input. A snapshot equal to the
    /// baseline (such as the echo of this editor's own save) is skipped.
    /// Values hidden by suppression survive in memory across a refresh.
    ///
    /// # Returns
    ///
    /// `true` if the snapshot was seeded, `false` if it was skipped
    pub fn apply_refresh(&mut self, snapshot: ContactSnapshot) -> bool {
        let reason = if self.is_save_pending() {
            Some("save in flight")
        } else if self.can_save() {
            Some("unsaved edits")
        } else if self.baseline.is_seeded() && self.baseline.baseline() == &snapshot {
            Some("matches baseline")
        } else {
            None
        };

        if let Some(reason) = reason {
            debug!("Skipping refresh of contact {}: {}", self.record_id, reason);
            self.emit_event(EditorEvent::RefreshSkipped {
                reason: reason.to_string(),
            });
            return false;
        }

        self.loaded = true;
        self.load_error = None;
        self.baseline.seed(snapshot, &mut self.working);
        self.suppression.refresh(self.baseline.baseline());
        self.suppression.normalize(&mut self.working);

        info!("Refreshed contact {}", self.record_id);
        self.emit_event(EditorEvent::Loaded {
            record_id: self.record_id.clone(),
            snapshot: self.baseline.baseline().clone(),
        });
        true
    }

    /// Save payload for the working copy, keyed by the configured API names
    pub fn api_payload(&self) -> Map<String, Value> {
        FieldMap::from_snapshot(&self.record_id, &self.working)
            .to_api_fields(&self.config.field_set)
    }

    /// Apply a user edit to email or phone
    pub fn edit_field(&mut self, field: Field, value: &str) -> EditOutcome {
        let outcome = self
            .suppression
            .on_field_edit(&mut self.working, field, value);

        match outcome {
            EditOutcome::Applied => self.emit_event(EditorEvent::FieldEdited {
                field,
                value: self.working.value(field).to_string(),
            }),
            EditOutcome::Ignored => {
                warn!("Edit to {} dropped while it is suppressed", field);
                self.emit_event(EditorEvent::EditIgnored { field });
            }
            EditOutcome::Unchanged => {}
        }

        outcome
    }

    /// Set or clear a suppression flag
    pub fn toggle_flag(&mut self, flag: Flag, value: bool) -> ToggleOutcome {
        let outcome = self
            .suppression
            .on_flag_toggle(&mut self.working, flag, value);

        if outcome != ToggleOutcome::Unchanged {
            self.emit_event(EditorEvent::FlagToggled { flag, value });
        }

        outcome
    }

    /// Re-apply the suppression rules to the working copy
    pub fn normalize(&mut self) {
        self.suppression.normalize(&mut self.working);
    }

    /// Discard unsaved input and return to the baseline
    pub fn reset(&mut self) {
        self.baseline.restore(&mut self.working);
        self.suppression.seed(self.baseline.baseline());
        self.suppression.normalize(&mut self.working);

        debug!("Reset contact {} to baseline", self.record_id);
        self.emit_event(EditorEvent::Reset);
    }

    /// Start a save of the current working copy
    ///
    /// # Returns
    ///
    /// - `Ok(SaveTicket)`: Hand `ticket.fields()` to the sink, then call
    ///   `complete_save()` with the outcome
    /// - `Err(Error::NotLoaded)`: No snapshot has been loaded
    /// - `Err(Error::SaveInFlight)`: Another save has not completed
    /// - `Err(Error::NothingToSave)`: The working copy equals the baseline
    pub fn begin_save(&mut self) -> Result<SaveTicket> {
        let rejection = if !self.baseline.is_seeded() {
            Some(Error::NotLoaded)
        } else if self.pending_save.is_some() {
            Some(Error::SaveInFlight)
        } else if !self.can_save() {
            Some(Error::NothingToSave)
        } else {
            None
        };

        if let Some(e) = rejection {
            warn!("Save of contact {} rejected: {}", self.record_id, e);
            self.emit_event(EditorEvent::SaveRejected {
                reason: e.to_string(),
            });
            return Err(e);
        }

        let id = self.next_ticket;
        self.next_ticket += 1;
        self.pending_save = Some(id);

        debug!("Saving contact {} (ticket {})", self.record_id, id);
        self.emit_event(EditorEvent::SaveStarted { ticket: id });

        Ok(SaveTicket {
            id,
            fields: FieldMap::from_snapshot(&self.record_id, &self.working),
            submitted: self.working.clone(),
        })
    }

    /// Finish a save started with `begin_save()`
    ///
    /// On success the submitted snapshot becomes the baseline. Edits made
    /// while the save was pending stay in the working copy and keep it dirty.
    /// On failure nothing but the pending marker changes.
    pub fn complete_save(&mut self, ticket: SaveTicket, outcome: Result<()>) -> Result<()> {
        if self.pending_save != Some(ticket.id) {
            warn!("Ignoring completion of unknown save ticket {}", ticket.id);
            return Err(Error::StaleSaveTicket(ticket.id));
        }
        self.pending_save = None;

        match outcome {
            Ok(()) => {
                self.baseline.commit(ticket.submitted);
                self.suppression.remember_committed(&self.working);

                info!("Saved contact {}", self.record_id);
                self.notify(SAVED_TITLE, SAVED_MESSAGE, Severity::Success);
                self.emit_event(EditorEvent::SaveSucceeded { ticket: ticket.id });
                Ok(())
            }
            Err(e) => {
                let message = e.user_message();
                error!("Failed to save contact {}: {}", self.record_id, e);

                self.notify(SAVE_FAILED_TITLE, message.clone(), Severity::Error);
                self.emit_event(EditorEvent::SaveFailed {
                    ticket: ticket.id,
                    error: message.clone(),
                });
                Err(Error::Save(message))
            }
        }
    }

    /// Persist the working copy through `sink`
    ///
    /// No retry is attempted; call again to retry after a failure.
    pub async fn save(&mut self, sink: &dyn RecordSink) -> Result<()> {
        let ticket = self.begin_save()?;
        let outcome = sink.update(ticket.fields()).await;
        self.complete_save(ticket, outcome)
    }

    fn notify(&self, title: &str, message: impl Into<String>, severity: Severity) {
        self.notifier.notify(Notification::new(
            title,
            message,
            severity,
            self.config.notification_mode,
        ));
    }

    /// Emit an editor event
    fn emit_event(&self, event: EditorEvent) {
        // Dropping is preferable to blocking an edit on a slow consumer
        if self.event_tx.try_send(event).is_err() {
            warn!(
                "Event channel full, dropping event. Consider increasing event_channel_capacity."
            );
        }
    }
}
