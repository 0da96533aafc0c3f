//! Core error types for dayblocks-core.
//!
//! Each component owns a small error enum; [`CoreError`] collects them for
//! callers (mainly the CLI) that do not care which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dayblocks-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session tracker errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Sequence engine errors
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),

    /// Duration text that could not be parsed
    #[error("Duration error: {0}")]
    Duration(#[from] DurationError),

    /// Errors talking to the authoritative backend
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the session tracker.
///
/// `AlreadyActive` and `NoActiveSession` are decided from local optimistic
/// state and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A session is already running (or provisionally running)
    #[error("a session is already active")]
    AlreadyActive,

    /// There is no session to end
    #[error("no active session")]
    NoActiveSession,

    /// The authoritative round-trip did not succeed; local state was rolled back
    #[error("{operation} confirmation failed: {message}")]
    ConfirmationFailed {
        operation: &'static str,
        message: String,
    },

    /// The confirmation arrived after the session had already been ended locally
    #[error("session was ended before its start was confirmed")]
    Cancelled,
}

impl SessionError {
    pub(crate) fn start_failed(message: impl Into<String>) -> Self {
        SessionError::ConfirmationFailed {
            operation: "start",
            message: message.into(),
        }
    }

    pub(crate) fn end_failed(message: impl Into<String>) -> Self {
        SessionError::ConfirmationFailed {
            operation: "end",
            message: message.into(),
        }
    }
}

/// Errors raised by the sequence engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// Every block of the day is completed
    #[error("sequence finished: every block is completed")]
    SequenceFinished,

    /// Block index outside the sequence
    #[error("block index {index} out of bounds (length: {len})")]
    OutOfBounds { index: usize, len: usize },

    /// Completion flags do not line up with the blocks
    #[error("{completed} completion flags for {blocks} blocks")]
    LengthMismatch { blocks: usize, completed: usize },

    /// Attempt to complete a block ahead of the current one
    #[error("block {index} cannot be completed before the current block {current}")]
    OutOfOrder { index: usize, current: usize },

    /// The runner task is gone
    #[error("sequence runner has stopped")]
    Stopped,

    /// Error bubbled up from the session tracker
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Duration codec errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// Text does not match the duration grammar
    #[error("malformed duration: {0:?}")]
    Malformed(String),
}

/// Errors at the HTTP boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request could not be sent or the body could not be read
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Payload decoded but violates the contract
    #[error("invalid {what} payload: {message}")]
    InvalidPayload { what: &'static str, message: String },

    /// Base URL could not be joined with an endpoint path
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    pub(crate) fn invalid(what: &'static str, message: impl Into<String>) -> Self {
        ApiError::InvalidPayload {
            what,
            message: message.into(),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be located or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
