//! Error types for the contact editor
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for contact editor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback detail shown when an error carries no message
const UNKNOWN_ERROR: &str = "Unknown error";

/// Core error type for the contact editor
#[derive(Error, Debug)]
pub enum Error {
    /// The record snapshot could not be loaded
    #[error("Load error: {0}")]
    Load(String),

    /// The persistence collaborator rejected a save
    #[error("Save error: {0}")]
    Save(String),

    /// No snapshot has been loaded yet
    #[error("Record not loaded")]
    NotLoaded,

    /// A save is already pending for this editor
    #[error("A save is already in flight")]
    SaveInFlight,

    /// Working state equals the baseline
    #[error("Nothing to save")]
    NothingToSave,

    /// A save completion arrived for a ticket the editor no longer tracks
    #[error("Save ticket {0} is not pending")]
    StaleSaveTicket(u64),

    /// Record store errors
    #[error("Record store error: {0}")]
    Store(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The editor dispatcher is no longer running
    #[error("Editor channel closed")]
    ChannelClosed,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a save error
    pub fn save(msg: impl Into<String>) -> Self {
        Self::Save(msg.into())
    }

    /// Create a record store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Detail suitable for a user-facing notification
    ///
    /// Collaborator errors carry their own message, which is returned as-is
    /// without the variant prefix. Everything else falls back to the
    /// `Display` rendering, and an empty message becomes `"Unknown error"`.
    pub fn user_message(&self) -> String {
        let detail = match self {
            Self::Load(msg)
            | Self::Save(msg)
            | Self::Store(msg)
            | Self::NotFound(msg)
            | Self::Other(msg) => msg.trim().to_string(),
            other => other.to_string(),
        };

        if detail.is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            detail
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
