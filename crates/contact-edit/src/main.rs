// # contact-edit - Contact Editor CLI
//
// This binary is a THIN driver around contact-core:
// - DO NOT add suppression or dirty-tracking logic here
// - All editing rules live in contact-core
// - Configuration is via environment variables ONLY
//
// The contact-edit binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Opening the record store selected by CONTACT_STORE_TYPE
// 3. Running an editor dispatcher for one contact
// 4. Applying the commands given on the command line, in order
// 5. Printing the resulting editor view as JSON on stdout
//
// ## Configuration
//
// - `CONTACT_STORE_TYPE`: Record store type: file, memory (default: file)
// - `CONTACT_STORE_PATH`: Path to the JSON records file (required for file)
// - `CONTACT_RECORD_ID`: Id of the contact to edit (required)
// - `CONTACT_PRESERVE_SUPPRESSED`: Restore values when a flag is cleared (default: true)
// - `CONTACT_HIDE_WHEN_SUPPRESSED`: Report the editor hidden while a flag is set (default: false)
// - `CONTACT_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Commands
//
// - `email=<value>` / `phone=<value>`: Edit a field
// - `do-not-call=<bool>` / `email-opt-out=<bool>`: Set or clear a flag
// - `save`: Persist the working copy
// - `reset`: Discard unsaved input
// - `show`: Print the current view
// - `payload`: Print what a save would send, keyed by field API names
//
// ## Example
//
// ```bash
// export CONTACT_STORE_PATH=/var/lib/contacts/records.json
// export CONTACT_RECORD_ID=003000000000001
//
// contact-edit do-not-call=true save
// ```

use anyhow::{Context, Result};
use contact_core::engine::EditOutcome;
use contact_core::traits::{RecordSink, RecordSource, TracingNotifier};
use contact_core::{
    ContactSnapshot, EditorConfig, EditorDispatcher, EditorHandle, Error, Field,
    FieldSuppressionEditor, FileRecordStore, Flag, MemoryRecordStore, StoreConfig,
};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const COMMAND_CAPACITY: usize = 16;

/// Exit codes for different termination scenarios
///
/// - 0: All commands applied
/// - 1: Configuration or usage error
/// - 2: Runtime error (load, save or store failure)
#[derive(Debug, Clone, Copy)]
enum ContactExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ContactExitCode> for ExitCode {
    fn from(code: ContactExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// One command-line operation
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Edit(Field, String),
    Toggle(Flag, bool),
    Save,
    Reset,
    Show,
    Payload,
}

impl Command {
    fn parse(arg: &str) -> Result<Self> {
        match arg {
            "save" => return Ok(Command::Save),
            "reset" => return Ok(Command::Reset),
            "show" => return Ok(Command::Show),
            "payload" => return Ok(Command::Payload),
            _ => {}
        }

        let Some((name, value)) = arg.split_once('=') else {
            anyhow::bail!(
                "Unknown command '{}'. \
                Valid commands: email=, phone=, do-not-call=, email-opt-out=, \
                save, reset, show, payload",
                arg
            );
        };

        match name {
            "email" => Ok(Command::Edit(Field::Email, value.to_string())),
            "phone" => Ok(Command::Edit(Field::Phone, value.to_string())),
            "do-not-call" => Ok(Command::Toggle(Flag::DoNotCall, parse_bool(name, value)?)),
            "email-opt-out" => Ok(Command::Toggle(Flag::EmailOptOut, parse_bool(name, value)?)),
            _ => anyhow::bail!("Unknown field '{}'", name),
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: '{}'", name, value),
    }
}

/// Application configuration
struct Config {
    store: StoreConfig,
    record_id: String,
    preserve_suppressed: bool,
    hide_when_suppressed: bool,
    log_level: String,
    commands: Vec<Command>,
}

impl Config {
    /// Load configuration from environment variables and commands from `args`
    fn from_env(args: impl Iterator<Item = String>) -> Result<Self> {
        let store_type = env::var("CONTACT_STORE_TYPE").unwrap_or_else(|_| "file".to_string());
        let store = match store_type.to_lowercase().as_str() {
            "file" => StoreConfig::File {
                path: env::var("CONTACT_STORE_PATH").context(
                    "CONTACT_STORE_PATH is required when CONTACT_STORE_TYPE=file. \
                    Set it via: export CONTACT_STORE_PATH=/var/lib/contacts/records.json",
                )?,
            },
            "memory" => StoreConfig::Memory,
            _ => anyhow::bail!(
                "CONTACT_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                store_type
            ),
        };
        let record_id = env::var("CONTACT_RECORD_ID").context(
            "CONTACT_RECORD_ID is required. \
            Set it via: export CONTACT_RECORD_ID=003000000000001",
        )?;

        Ok(Self {
            store,
            record_id: record_id.trim().to_string(),
            preserve_suppressed: bool_var("CONTACT_PRESERVE_SUPPRESSED", true)?,
            hide_when_suppressed: bool_var("CONTACT_HIDE_WHEN_SUPPRESSED", false)?,
            log_level: env::var("CONTACT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            commands: args.map(|arg| Command::parse(&arg)).collect::<Result<_>>()?,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.store.validate()?;

        if self.record_id.is_empty() {
            anyhow::bail!("CONTACT_RECORD_ID cannot be empty");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "CONTACT_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.editor_config().validate()?;
        Ok(())
    }

    fn editor_config(&self) -> EditorConfig {
        EditorConfig::default()
            .with_preserve_suppressed_values(self.preserve_suppressed)
            .with_hide_when_suppressed(self.hide_when_suppressed)
    }
}

fn bool_var(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(value) => parse_bool(name, &value),
        Err(_) => Ok(default),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env(env::args().skip(1)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ContactExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ContactExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON view
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ContactExitCode::ConfigError.into();
    }

    info!("Editing contact {}", config.record_id);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ContactExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run(config).await {
            error!("contact-edit failed: {:#}", e);
            ContactExitCode::RuntimeError
        } else {
            ContactExitCode::Success
        }
    });

    result.into()
}

/// Run the editor for the configured contact
async fn run(config: Config) -> Result<()> {
    let (source, sink) = open_store(&config.store, &config.record_id).await?;

    let (editor, mut events) = FieldSuppressionEditor::new(
        config.record_id.clone(),
        config.editor_config(),
        Arc::new(TracingNotifier),
    )?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "Editor event");
        }
    });

    let (dispatcher, handle) =
        EditorDispatcher::new(editor, source, sink, COMMAND_CAPACITY);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let dispatcher_task = tokio::spawn(dispatcher.run_with_shutdown(Some(shutdown_rx)));

    let outcome = tokio::select! {
        result = apply_commands(&handle, &config.commands) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping editor");
            Ok(())
        }
    };

    if outcome.is_ok() {
        print_view(&handle).await?;
    }

    drop(handle);
    let _ = shutdown_tx.send(());
    let editor = dispatcher_task
        .await
        .context("editor dispatcher panicked")??;

    if editor.can_save() {
        warn!("Contact {} has unsaved changes", editor.record_id());
    }

    outcome
}

/// Apply each command through the dispatcher
async fn apply_commands(handle: &EditorHandle, commands: &[Command]) -> Result<()> {
    let view = handle.view().await?;
    if let Some(load_error) = view.load_error {
        anyhow::bail!("Failed to load contact: {}", load_error);
    }

    for command in commands {
        match command {
            Command::Edit(field, value) => {
                if handle.edit_field(*field, value.as_str()).await? == EditOutcome::Ignored {
                    warn!("{} is suppressed; edit dropped", field);
                }
            }
            Command::Toggle(flag, value) => {
                handle.toggle_flag(*flag, *value).await?;
            }
            Command::Save => match handle.save().await {
                Ok(()) => {}
                Err(Error::NothingToSave) => info!("Nothing to save"),
                Err(e) => return Err(e.into()),
            },
            Command::Reset => handle.reset().await?,
            Command::Show => print_view(handle).await?,
            Command::Payload => {
                let payload = serde_json::Value::Object(handle.payload().await?);
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
        }
    }

    Ok(())
}

/// Build the record store selected by `config`
///
/// The memory store starts with a blank contact so a session can be tried
/// without a records file. Nothing it holds outlives the process.
async fn open_store(
    config: &StoreConfig,
    record_id: &str,
) -> Result<(Arc<dyn RecordSource>, Arc<dyn RecordSink>)> {
    match config {
        StoreConfig::File { path } => {
            let store = Arc::new(
                FileRecordStore::new(path)
                    .await
                    .with_context(|| format!("opening {}", path))?,
            );
            Ok((store.clone(), store))
        }
        StoreConfig::Memory => {
            warn!("Using in-memory record store; changes will not be persisted");
            let store = Arc::new(MemoryRecordStore::new());
            store.insert(record_id, ContactSnapshot::default()).await;
            Ok((store.clone(), store))
        }
    }
}

async fn print_view(handle: &EditorHandle) -> Result<()> {
    let view = handle.view().await?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_and_flag_commands() {
        assert_eq!(
            Command::parse("email=a@b.com").unwrap(),
            Command::Edit(Field::Email, "a@b.com".to_string())
        );
        assert_eq!(
            Command::parse("phone=").unwrap(),
            Command::Edit(Field::Phone, String::new())
        );
        assert_eq!(
            Command::parse("do-not-call=yes").unwrap(),
            Command::Toggle(Flag::DoNotCall, true)
        );
        assert_eq!(
            Command::parse("email-opt-out=FALSE").unwrap(),
            Command::Toggle(Flag::EmailOptOut, false)
        );
        assert_eq!(Command::parse("save").unwrap(), Command::Save);
        assert_eq!(Command::parse("payload").unwrap(), Command::Payload);
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(Command::parse("delete").is_err());
        assert!(Command::parse("fax=555").is_err());
        assert!(Command::parse("do-not-call=maybe").is_err());
    }

    fn config_with(store: StoreConfig, log_level: &str) -> Config {
        Config {
            store,
            record_id: "003000000000001".to_string(),
            preserve_suppressed: true,
            hide_when_suppressed: false,
            log_level: log_level.to_string(),
            commands: Vec::new(),
        }
    }

    #[test]
    fn validate_rejects_bad_log_level() {
        let config = config_with(StoreConfig::Memory, "verbose");

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_store_path() {
        let config = config_with(StoreConfig::File { path: " ".to_string() }, "info");

        assert!(config.validate().is_err());
        assert!(config_with(StoreConfig::Memory, "debug").validate().is_ok());
    }

    #[tokio::test]
    async fn file_store_round_trips_through_editor_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let record_id = "003000000000001";

        let seed = FileRecordStore::new(&path).await.unwrap();
        seed.insert(record_id, ContactSnapshot::new("a@b.com", "555-1212", false, false))
            .await
            .unwrap();
        drop(seed);

        let store = StoreConfig::File {
            path: path.to_string_lossy().into_owned(),
        };
        let (source, sink) = open_store(&store, record_id).await.unwrap();
        let (editor, _events) = FieldSuppressionEditor::new(
            record_id,
            EditorConfig::default(),
            Arc::new(TracingNotifier),
        )
        .unwrap();
        let (dispatcher, handle) = EditorDispatcher::new(editor, source, sink, COMMAND_CAPACITY);
        let task = tokio::spawn(dispatcher.run());

        let commands = [
            Command::parse("do-not-call=true").unwrap(),
            Command::parse("save").unwrap(),
        ];
        apply_commands(&handle, &commands).await.unwrap();
        drop(handle);
        task.await.unwrap().unwrap();

        let reopened = FileRecordStore::new(&path).await.unwrap();
        let stored = reopened.get(record_id).await.unwrap();
        assert!(stored.do_not_call);
        assert_eq!(stored.phone, None);
    }

    #[tokio::test]
    async fn memory_store_starts_with_blank_contact() {
        let (source, _sink) = open_store(&StoreConfig::Memory, "003000000000001")
            .await
            .unwrap();

        let snapshot = source.fetch("003000000000001").await.unwrap();
        assert_eq!(snapshot, ContactSnapshot::default());
    }
}
