//! Editor dispatcher
//!
//! The EditorDispatcher owns a [`FieldSuppressionEditor`] and is its only
//! writer. UI code talks to it through a cloneable [`EditorHandle`].
//!
//! ## Event Flow
//!
//! 1. Subscribe to record changes, then fetch the record
//! 2. Deliver the fetch result to the editor
//! 3. Apply commands from handles one at a time, in arrival order
//! 4. Run saves on a spawned task so edits keep flowing while the sink works
//! 5. Apply record refreshes while the editor is clean
//! 6. On shutdown, wait for an in-flight save to finish
//!
//! ```text
//!  EditorHandle ── EditorCommand ──┐
//!                                  ▼
//!  RecordSource ── RecordUpdate ─▶ EditorDispatcher ── spawn ──▶ RecordSink
//!                                  ▲                               │
//!                                  └────── save completion ────────┘
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::engine::{EditOutcome, FieldSuppressionEditor, SaveTicket, ToggleOutcome};
use crate::error::{Error, Result};
use crate::model::{Field, Flag};
use crate::traits::{RecordSink, RecordSource};
use crate::view::EditorView;

/// A request from a handle to the dispatcher
#[derive(Debug)]
pub enum EditorCommand {
    EditField {
        field: Field,
        value: String,
        reply: oneshot::Sender<EditOutcome>,
    },
    ToggleFlag {
        flag: Flag,
        value: bool,
        reply: oneshot::Sender<ToggleOutcome>,
    },
    /// Replied to once the save completes or is rejected
    Save { reply: oneshot::Sender<Result<()>> },
    Reset { reply: oneshot::Sender<()> },
    View { reply: oneshot::Sender<EditorView> },
    Payload { reply: oneshot::Sender<Map<String, Value>> },
}

/// Cloneable client of an [`EditorDispatcher`]
#[derive(Debug, Clone)]
pub struct EditorHandle {
    tx: mpsc::Sender<EditorCommand>,
}

impl EditorHandle {
    /// Apply a user edit to email or phone
    pub async fn edit_field(&self, field: Field, value: impl Into<String>) -> Result<EditOutcome> {
        let value = value.into();
        self.request(|reply| EditorCommand::EditField { field, value, reply })
            .await
    }

    /// Set or clear a suppression flag
    pub async fn toggle_flag(&self, flag: Flag, value: bool) -> Result<ToggleOutcome> {
        self.request(|reply| EditorCommand::ToggleFlag { flag, value, reply })
            .await
    }

    /// Save the working copy and wait for the outcome
    ///
    /// A request made while another save is pending fails with
    /// [`Error::SaveInFlight`].
    pub async fn save(&self) -> Result<()> {
        self.request(|reply| EditorCommand::Save { reply }).await?
    }

    /// Discard unsaved input
    pub async fn reset(&self) -> Result<()> {
        self.request(|reply| EditorCommand::Reset { reply }).await
    }

    /// Current rendered state
    pub async fn view(&self) -> Result<EditorView> {
        self.request(|reply| EditorCommand::View { reply }).await
    }

    /// Save payload for the working copy, keyed by the configured API names
    pub async fn payload(&self) -> Result<Map<String, Value>> {
        self.request(|reply| EditorCommand::Payload { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> EditorCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| Error::ChannelClosed)?;
        reply_rx.await.map_err(|_| Error::ChannelClosed)
    }
}

/// Single writer for a [`FieldSuppressionEditor`]
pub struct EditorDispatcher {
    editor: FieldSuppressionEditor,
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn RecordSink>,
    commands: mpsc::Receiver<EditorCommand>,
}

impl EditorDispatcher {
    /// Create a dispatcher and the first handle to it
    ///
    /// # Parameters
    ///
    /// - `editor`: Editor to drive; it is loaded when the dispatcher runs
    /// - `source`: Where the record is fetched and watched
    /// - `sink`: Where saves are written
    /// - `command_capacity`: Commands buffered before handles wait
    pub fn new(
        editor: FieldSuppressionEditor,
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn RecordSink>,
        command_capacity: usize,
    ) -> (Self, EditorHandle) {
        let (tx, rx) = mpsc::channel(command_capacity.max(1));

        let dispatcher = Self {
            editor,
            source,
            sink,
            commands: rx,
        };

        (dispatcher, EditorHandle { tx })
    }

    /// Run until every handle has been dropped
    ///
    /// # Returns
    ///
    /// The editor in its final state
    pub async fn run(self) -> Result<FieldSuppressionEditor> {
        self.run_with_shutdown(None).await
    }

    /// Run until every handle has been dropped or `shutdown_rx` fires
    ///
    /// Dropping the shutdown sender counts as a shutdown signal.
    pub async fn run_with_shutdown(
        self,
        mut shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<FieldSuppressionEditor> {
        let Self {
            mut editor,
            source,
            sink,
            mut commands,
        } = self;

        let record_id = editor.record_id().to_string();

        // Subscribe first so no change between fetch and watch is missed
        let mut refreshes = source.watch(&record_id);
        let loaded = source.fetch(&record_id).await;
        editor.on_load_result(loaded);

        info!("Editor dispatcher started for contact {}", record_id);

        let (done_tx, mut done_rx) = mpsc::channel::<(SaveTicket, Result<()>)>(1);
        let mut save_reply: Option<oneshot::Sender<Result<()>>> = None;

        loop {
            tokio::select! {
                Some((ticket, outcome)) = done_rx.recv() => {
                    let result = editor.complete_save(ticket, outcome);
                    if let Some(reply) = save_reply.take() {
                        let _ = reply.send(result);
                    }
                }

                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("All editor handles dropped");
                        break;
                    };

                    match command {
                        EditorCommand::EditField { field, value, reply } => {
                            let _ = reply.send(editor.edit_field(field, &value));
                        }
                        EditorCommand::ToggleFlag { flag, value, reply } => {
                            let _ = reply.send(editor.toggle_flag(flag, value));
                        }
                        EditorCommand::Reset { reply } => {
                            editor.reset();
                            let _ = reply.send(());
                        }
                        EditorCommand::View { reply } => {
                            let _ = reply.send(editor.view());
                        }
                        EditorCommand::Payload { reply } => {
                            let _ = reply.send(editor.api_payload());
                        }
                        EditorCommand::Save { reply } => match editor.begin_save() {
                            Ok(ticket) => {
                                save_reply = Some(reply);
                                let sink = Arc::clone(&sink);
                                let done_tx = done_tx.clone();
                                tokio::spawn(async move {
                                    let outcome = sink.update(ticket.fields()).await;
                                    let _ = done_tx.send((ticket, outcome)).await;
                                });
                            }
                            Err(e) => {
                                let _ = reply.send(Err(e));
                            }
                        },
                    }
                }

                Some(update) = refreshes.next() => {
                    debug!("Contact {} changed at source", update.record_id);
                    editor.apply_refresh(update.snapshot);
                }

                _ = shutdown_signal(&mut shutdown_rx) => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        // A save in flight cannot be aborted; wait for it
        while editor.is_save_pending() {
            warn!("Waiting for in-flight save of contact {}", record_id);
            let Some((ticket, outcome)) = done_rx.recv().await else {
                break;
            };
            let result = editor.complete_save(ticket, outcome);
            if let Some(reply) = save_reply.take() {
                let _ = reply.send(result);
            }
        }

        info!("Editor dispatcher stopped for contact {}", record_id);
        Ok(editor)
    }
}

async fn shutdown_signal(shutdown_rx: &mut Option<oneshot::Receiver<()>>) {
    match shutdown_rx {
        Some(rx) => {
            let _ = rx.await;
        }
        None => std::future::pending::<()>().await,
    }
}
