//! Contract Test: Baseline, Save and Load Failure
//!
//! This test verifies that the dirty check gates saving and that the
//! baseline only moves on a successful load or save.
//!
//! Constraints verified:
//! - A freshly loaded or reset editor has nothing to save
//! - A successful save adopts the saved state as baseline
//! - A failed save leaves the working copy and dirty flag untouched
//! - A failed load leaves defaults and surfaces the failure
//! - Failures are never retried automatically

mod common;

use common::*;
use contact_core::traits::Severity;
use contact_core::{
    ContactSnapshot, EditorConfig, EditorEvent, Error, Field, Flag, NotificationMode,
};

#[test]
fn dirty_gating_follows_load_edit_reset() {
    let (mut editor, _events, _notifier) =
        loaded_editor(ContactSnapshot::new("a@b.com", "555-1212", false, false));
    assert!(!editor.can_save());

    editor.edit_field(Field::Email, "c@d.com");
    assert!(editor.can_save());

    editor.reset();
    assert!(!editor.can_save());
    assert_eq!(editor.working().email, "a@b.com");
}

#[test]
fn edit_back_to_baseline_is_clean() {
    let (mut editor, _events, _notifier) =
        loaded_editor(ContactSnapshot::new("a@b.com", "", false, false));

    editor.edit_field(Field::Email, "c@d.com");
    editor.edit_field(Field::Email, "a@b.com ");

    assert!(!editor.can_save());
}

#[tokio::test]
async fn successful_save_commits_baseline() {
    let (mut editor, _events, notifier) =
        loaded_editor(ContactSnapshot::new("a@b.com", "555-1212", false, false));
    let sink = RecordingSink::new();

    editor.toggle_flag(Flag::DoNotCall, true);
    assert!(editor.can_save());

    editor.save(&sink).await.unwrap();

    let expected = ContactSnapshot::new("a@b.com", "", true, false);
    assert_eq!(editor.baseline(), &expected);
    assert_eq!(editor.working(), &expected);
    assert!(!editor.can_save());

    let notification = notifier.last().unwrap();
    assert_eq!(notification.title, "Saved");
    assert_eq!(notification.message, "Contact updated successfully.");
    assert_eq!(notification.severity, Severity::Success);
    assert_eq!(notification.mode, NotificationMode::Pester);
}

#[tokio::test]
async fn save_payload_carries_none_for_empty_fields() {
    let (mut editor, _events, _notifier) =
        loaded_editor(ContactSnapshot::new("a@b.com", "555-1212", false, false));
    let sink = RecordingSink::new();

    editor.toggle_flag(Flag::DoNotCall, true);
    editor.save(&sink).await.unwrap();

    let updates = sink.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, RECORD_ID);
    assert_eq!(updates[0].email.as_deref(), Some("a@b.com"));
    assert_eq!(updates[0].phone, None);
    assert!(updates[0].do_not_call);
    assert!(!updates[0].email_opt_out);
}

#[tokio::test]
async fn suppression_after_save_still_restores() {
    let (mut editor, _events, _notifier) =
        loaded_editor(ContactSnapshot::new("a@b.com", "555-1212", false, false));
    let sink = RecordingSink::new();

    editor.toggle_flag(Flag::DoNotCall, true);
    editor.save(&sink).await.unwrap();

    // The saved blank phone must not erase the remembered number
    editor.toggle_flag(Flag::DoNotCall, false);
    assert_eq!(editor.working().phone, "555-1212");
}

#[tokio::test]
async fn failed_save_leaves_state_untouched() {
    let (mut editor, mut events, notifier) =
        loaded_editor(ContactSnapshot::new("a@b.com", "", false, false));
    let sink = RecordingSink::new();
    sink.fail_with("UNABLE_TO_LOCK_ROW");

    editor.edit_field(Field::Phone, "555-1212");
    let working_before = editor.working().clone();
    let baseline_before = editor.baseline().clone();

    let result = editor.save(&sink).await;

    assert!(matches!(result, Err(Error::Save(ref msg)) if msg == "UNABLE_TO_LOCK_ROW"));
    assert_eq!(editor.working(), &working_before);
    assert_eq!(editor.baseline(), &baseline_before);
    assert!(editor.can_save());
    assert!(!editor.is_save_pending());

    let notification = notifier.last().unwrap();
    assert_eq!(notification.title, "Save failed");
    assert_eq!(notification.message, "UNABLE_TO_LOCK_ROW");
    assert_eq!(notification.severity, Severity::Error);

    // Exactly one attempt, no retry
    assert_eq!(sink.updates().len(), 1);

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let EditorEvent::SaveFailed { error, .. } = event {
            assert_eq!(error, "UNABLE_TO_LOCK_ROW");
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn manual_retry_after_failure_succeeds() {
    let (mut editor, _events, _notifier) =
        loaded_editor(ContactSnapshot::new("a@b.com", "", false, false));
    let sink = RecordingSink::new();

    editor.edit_field(Field::Phone, "555-1212");
    sink.fail_with("timeout");
    assert!(editor.save(&sink).await.is_err());

    sink.succeed();
    editor.save(&sink).await.unwrap();

    assert_eq!(sink.updates().len(), 2);
    assert!(!editor.can_save());
}

#[tokio::test]
async fn clean_editor_refuses_to_save() {
    let (mut editor, _events, _notifier) =
        loaded_editor(ContactSnapshot::new("a@b.com", "", false, false));
    let sink = RecordingSink::new();

    let result = editor.save(&sink).await;

    assert!(matches!(result, Err(Error::NothingToSave)));
    assert!(sink.updates().is_empty());
}

#[test]
fn load_failure_leaves_defaults() {
    let (mut editor, mut events, notifier) = editor_with(EditorConfig::default());

    editor.on_load_result(Err(Error::load("INVALID_CROSS_REFERENCE_KEY: invalid id")));

    assert!(editor.loaded());
    assert_eq!(editor.working(), &ContactSnapshot::default());
    assert!(!editor.can_save());
    assert_eq!(
        editor.load_error(),
        Some("INVALID_CROSS_REFERENCE_KEY: invalid id")
    );

    let notification = notifier.last().unwrap();
    assert_eq!(notification.title, "Error loading contact");
    assert!(notification.message.contains("INVALID_CROSS_REFERENCE_KEY"));
    assert_eq!(notification.severity, Severity::Error);

    assert!(matches!(
        events.try_recv(),
        Ok(EditorEvent::LoadFailed { .. })
    ));

    let view = editor.view();
    assert!(view.loaded);
    assert!(view.visible);
    assert_eq!(view.email, "");
}

#[test]
fn load_failure_after_data_keeps_baseline() {
    let (mut editor, _events, _notifier) =
        loaded_editor(ContactSnapshot::new("a@b.com", "555-1212", false, false));
    editor.edit_field(Field::Email, "c@d.com");

    editor.on_load_result(Err(Error::load("network")));

    assert_eq!(editor.working().email, "c@d.com");
    assert_eq!(editor.baseline().email, "a@b.com");
}

#[test]
fn visibility_policy_hides_suppressed_contact() {
    let config = EditorConfig::default().with_hide_when_suppressed(true);
    let (mut editor, _events, _notifier) = editor_with(config);
    assert!(!editor.view().visible);

    editor.on_load_result(Ok(ContactSnapshot::new("a@b.com", "555-1212", false, false)));
    assert!(editor.view().visible);

    editor.toggle_flag(Flag::EmailOptOut, true);
    assert!(!editor.view().visible);
}

#[test]
fn notification_mode_is_configurable() {
    let config = EditorConfig::default().with_notification_mode(NotificationMode::Sticky);
    let (mut editor, _events, notifier) = editor_with(config);

    editor.on_load_result(Err(Error::load("")));

    let notification = notifier.last().unwrap();
    assert_eq!(notification.mode, NotificationMode::Sticky);
    assert_eq!(notification.message, "Unknown error");
}
