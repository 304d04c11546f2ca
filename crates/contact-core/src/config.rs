//! Configuration types for the contact editor
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Main editor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Restore the last unsuppressed value when a suppression flag is cleared
    ///
    /// When `false`, a field cleared by suppression stays blank until the
    /// user enters a new value.
    #[serde(default = "default_preserve_suppressed_values")]
    pub preserve_suppressed_values: bool,

    /// Report the editor as hidden once either suppression flag is set
    #[serde(default)]
    pub hide_when_suppressed: bool,

    /// Presentation mode attached to every notification
    #[serde(default)]
    pub notification_mode: NotificationMode,

    /// API names of the record fields the editor reads and writes
    #[serde(default)]
    pub field_set: FieldSetDescriptor,

    /// Capacity of the editor event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EditorConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            preserve_suppressed_values: default_preserve_suppressed_values(),
            hide_when_suppressed: false,
            notification_mode: NotificationMode::default(),
            field_set: FieldSetDescriptor::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Select the restore-on-uncheck policy
    pub fn with_preserve_suppressed_values(mut self, preserve: bool) -> Self {
        self.preserve_suppressed_values = preserve;
        self
    }

    /// Enable or disable hiding the editor while suppressed
    pub fn with_hide_when_suppressed(mut self, hide: bool) -> Self {
        self.hide_when_suppressed = hide;
        self
    }

    /// Set the notification mode
    pub fn with_notification_mode(mut self, mode: NotificationMode) -> Self {
        self.notification_mode = mode;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.field_set.validate()
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// API names of the fields that make up a contact record
///
/// Supplied at construction so the editor never depends on a hosting
/// platform's global schema definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSetDescriptor {
    #[serde(default = "default_id_field")]
    pub id: String,
    #[serde(default = "default_email_field")]
    pub email: String,
    #[serde(default = "default_phone_field")]
    pub phone: String,
    #[serde(default = "default_do_not_call_field")]
    pub do_not_call: String,
    #[serde(default = "default_email_opt_out_field")]
    pub email_opt_out: String,
}

impl FieldSetDescriptor {
    /// All API names in a fixed order
    pub fn names(&self) -> [&str; 5] {
        [
            &self.id,
            &self.email,
            &self.phone,
            &self.do_not_call,
            &self.email_opt_out,
        ]
    }

    /// Validate the descriptor
    ///
    /// Every API name must be non-empty and distinct.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let mut seen = HashSet::new();
        for name in self.names() {
            if name.trim().is_empty() {
                return Err(crate::Error::config("Field API names cannot be empty"));
            }
            if !seen.insert(name) {
                return Err(crate::Error::config(format!(
                    "Field API name '{}' is used more than once",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl Default for FieldSetDescriptor {
    fn default() -> Self {
        Self {
            id: default_id_field(),
            email: default_email_field(),
            phone: default_phone_field(),
            do_not_call: default_do_not_call_field(),
            email_opt_out: default_email_opt_out_field(),
        }
    }
}

/// How long a notification stays on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    /// Closes on user action or after a timeout
    Dismissible,
    /// Closes after a timeout, no close button
    #[default]
    Pester,
    /// Stays until the user closes it
    Sticky,
}

/// Record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// File-based record store
    File {
        /// Path to the records file
        path: String,
    },

    /// In-memory record store (not persistent)
    #[default]
    Memory,
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.trim().is_empty() => {
                Err(crate::Error::config("Record store path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

fn default_preserve_suppressed_values() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    256
}

fn default_id_field() -> String {
    "Id".to_string()
}

fn default_email_field() -> String {
    "Email".to_string()
}

fn default_phone_field() -> String {
    "Phone".to_string()
}

fn default_do_not_call_field() -> String {
    "DoNotCall".to_string()
}

fn default_email_opt_out_field() -> String {
    "HasOptedOutOfEmail".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = EditorConfig::default();
        assert!(config.preserve_suppressed_values);
        assert!(!config.hide_when_suppressed);
        assert_eq!(config.notification_mode, NotificationMode::Pester);
        config.validate().unwrap();
    }

    #[test]
    fn duplicate_api_names_rejected() {
        let mut config = EditorConfig::default();
        config.field_set.phone = "Email".to_string();
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn zero_channel_capacity_rejected() {
        let mut config = EditorConfig::default();
        config.event_channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EditorConfig = serde_json::from_str(
            r#"{"preserve_suppressed_values": false, "field_set": {"phone": "MobilePhone"}}"#,
        )
        .unwrap();

        assert!(!config.preserve_suppressed_values);
        assert_eq!(config.field_set.phone, "MobilePhone");
        assert_eq!(config.field_set.email, "Email");
        assert_eq!(config.event_channel_capacity, 256);
    }

    #[test]
    fn store_config_tagged() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"type": "file", "path": "/tmp/contacts.json"}"#).unwrap();
        assert!(matches!(config, StoreConfig::File { .. }));
        assert!(StoreConfig::File { path: " ".into() }.validate().is_err());
    }
}
