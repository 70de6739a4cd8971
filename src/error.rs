//! Error types for busypenguin.

use thiserror::Error;

/// Errors raised while building or publishing a status message.
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP round-trip to the chat API failed (connect, timeout, TLS, ...).
    #[error("chat API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The chat API answered but reported a failure (`ok: false`).
    #[error("chat API method {method} failed: {error}")]
    Api { method: String, error: String },

    /// `chat.postMessage` succeeded but did not return a message timestamp.
    #[error("chat API did not return a message timestamp")]
    MissingTimestamp,

    #[error("field index {index} out of range (message has {len} fields)")]
    FieldOutOfRange { index: usize, len: usize },

    /// `enter`/`run` called on a task or subtask that already left `Pending`.
    #[error("{scope} already started (state: {state})")]
    AlreadyStarted { scope: &'static str, state: String },

    #[error("attachment index {index} out of range (message has {len} extra attachments)")]
    AttachmentOutOfRange { index: usize, len: usize },

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error came from talking to the remote API.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Api { .. } | Self::MissingTimestamp
        )
    }

    /// Whether the error is an invalid field or attachment index.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::FieldOutOfRange { .. } | Self::AttachmentOutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
