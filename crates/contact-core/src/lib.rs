// # contact-core
//
// Core library for the contact field-suppression editor.
//
// ## Architecture Overview
//
// This library keeps a contact's email and phone consistent with its
// do-not-call and email-opt-out flags while the contact is being edited:
// - **FieldSuppressionEditor**: Baseline, working copy and suppression rules
// - **SuppressionEngine**: Clears suppressed fields and restores them later
// - **BaselineTracker**: Last persisted snapshot, dirty check and reset
// - **EditorDispatcher**: Single-writer event loop in front of an editor
// - **RecordSource / RecordSink / Notifier**: Collaborator interfaces
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Editing rules never perform I/O
// 2. **Event-Driven**: One operation at a time, in arrival order
// 3. **Collaborators by Trait**: Record transport and notification are pluggable
// 4. **Library-First**: The command-line driver is a thin wrapper
// 5. **Idempotency**: Normalizing or re-toggling a flag never changes state twice

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;
pub mod traits;
pub mod view;

// Re-export core types for convenience
pub use config::{EditorConfig, FieldSetDescriptor, NotificationMode, StoreConfig};
pub use dispatcher::{EditorCommand, EditorDispatcher, EditorHandle};
pub use engine::{EditorEvent, FieldSuppressionEditor, SaveTicket};
pub use error::{Error, Result};
pub use model::{ContactSnapshot, Field, FieldMap, Flag};
pub use store::{FileRecordStore, MemoryRecordStore};
pub use traits::{Notifier, RecordSink, RecordSource};
pub use view::{EditorView, FlagsReader};
