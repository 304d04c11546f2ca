//! Collaborator traits for the contact editor
//!
//! The editor core talks to the outside world only through these interfaces.
//!
//! - [`RecordSource`]: Fetch a record and watch it for changes
//! - [`RecordSink`]: Persist a record's fields
//! - [`Notifier`]: Surface user-visible messages

pub mod notifier;
pub mod record_sink;
pub mod record_source;

pub use notifier::{Notification, Notifier, Severity, TracingNotifier};
pub use record_sink::RecordSink;
pub use record_source::{RecordSource, RecordUpdate};
