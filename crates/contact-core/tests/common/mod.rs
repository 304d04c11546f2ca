//! Test doubles and common utilities for editor contract tests
//!
//! This module provides minimal collaborators that record how the editor
//! uses them, without implementing real persistence.

#![allow(dead_code)]

use contact_core::error::{Error, Result};
use contact_core::model::{ContactSnapshot, FieldMap};
use contact_core::traits::{Notification, Notifier, RecordSink, RecordSource, RecordUpdate};
use contact_core::{EditorConfig, EditorEvent, FieldSuppressionEditor};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Semaphore, mpsc};
use tokio_stream::Stream;

pub const RECORD_ID: &str = "003000000000001";

/// A notifier that keeps every notification it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far
    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }

    /// The most recent notification
    pub fn last(&self) -> Option<Notification> {
        self.received.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().unwrap().push(notification);
    }
}

/// A record source with a fixed fetch result and a controllable watch stream
pub struct ScriptedSource {
    snapshot: Option<ContactSnapshot>,
    failure: Option<String>,
    /// Receiver for the watch stream (taken on first watch)
    watch_rx: Mutex<Option<mpsc::UnboundedReceiver<RecordUpdate>>>,
    /// Call counter for fetch()
    fetch_call_count: Arc<AtomicUsize>,
}

impl ScriptedSource {
    /// A source whose fetch returns `snapshot`
    pub fn with(snapshot: ContactSnapshot) -> (Self, mpsc::UnboundedSender<RecordUpdate>) {
        Self::build(Some(snapshot), None)
    }

    /// A source whose fetch fails with `message`
    pub fn failing(message: &str) -> (Self, mpsc::UnboundedSender<RecordUpdate>) {
        Self::build(None, Some(message.to_string()))
    }

    fn build(
        snapshot: Option<ContactSnapshot>,
        failure: Option<String>,
    ) -> (Self, mpsc::UnboundedSender<RecordUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            snapshot,
            failure,
            watch_rx: Mutex::new(Some(rx)),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        };
        (source, tx)
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordSource for ScriptedSource {
    async fn fetch(&self, record_id: &str) -> Result<ContactSnapshot> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        match (&self.snapshot, &self.failure) {
            (_, Some(message)) => Err(Error::load(message.clone())),
            (Some(snapshot), None) => Ok(snapshot.clone()),
            (None, None) => Err(Error::not_found(record_id)),
        }
    }

    fn watch(
        &self,
        _record_id: &str,
    ) -> Pin<Box<dyn Stream<Item = RecordUpdate> + Send + 'static>> {
        let rx = self
            .watch_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");
        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }
}

/// A record sink that records payloads and can be told to fail
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    updates: Arc<Mutex<Vec<FieldMap>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following update fail with `message`
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// Let following updates succeed again
    pub fn succeed(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Payloads received so far
    pub fn updates(&self) -> Vec<FieldMap> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordSink for RecordingSink {
    async fn update(&self, fields: &FieldMap) -> Result<()> {
        self.updates.lock().unwrap().push(fields.clone());
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(Error::save(message)),
            None => Ok(()),
        }
    }
}

/// A record sink that holds every update until released
#[derive(Debug, Clone)]
pub struct GatedSink {
    gate: Arc<Semaphore>,
    update_call_count: Arc<AtomicUsize>,
}

impl GatedSink {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(0)),
            update_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Let one pending (or future) update complete
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Get the number of times update() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordSink for GatedSink {
    async fn update(&self, _fields: &FieldMap) -> Result<()> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| Error::save("gate closed"))?;
        permit.forget();
        Ok(())
    }
}

/// Create an editor that reports to a recording notifier
pub fn editor_with(
    config: EditorConfig,
) -> (
    FieldSuppressionEditor,
    mpsc::Receiver<EditorEvent>,
    RecordingNotifier,
) {
    let notifier = RecordingNotifier::new();
    let (editor, events) =
        FieldSuppressionEditor::new(RECORD_ID, config, Arc::new(notifier.clone()))
            .expect("editor construction succeeds");
    (editor, events, notifier)
}

/// Create an editor already loaded with `snapshot`
pub fn loaded_editor(
    snapshot: ContactSnapshot,
) -> (
    FieldSuppressionEditor,
    mpsc::Receiver<EditorEvent>,
    RecordingNotifier,
) {
    let (mut editor, events, notifier) = editor_with(EditorConfig::default());
    editor.on_load_result(Ok(snapshot));
    (editor, events, notifier)
}

/// Assert both suppression invariants on the editor's working copy
pub fn assert_invariants(editor: &FieldSuppressionEditor) {
    let working = editor.working();
    if working.do_not_call {
        assert_eq!(working.phone, "", "do_not_call set but phone is {:?}", working.phone);
    }
    if working.email_opt_out {
        assert_eq!(working.email, "", "email_opt_out set but email is {:?}", working.email);
    }
}
