//! Error types for the shell session engine

use thiserror::Error;

/// Main error type for the shell session engine
#[derive(Error, Debug)]
pub enum ShellError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error for history records
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The history file location could not be resolved
    #[error("History location error: {0}")]
    HistoryLocation(String),

    /// A history record was not valid UTF-8
    #[error("History line {line} isn't valid utf8")]
    InvalidUtf8 {
        /// 1-based line number in the history file
        line: usize,
    },

    /// A history record exceeded the maximum line length
    #[error("History line {line} is too long ({len} bytes, limit {limit})")]
    LineTooLong {
        /// 1-based line number in the history file
        line: usize,
        /// Length of the offending line in bytes
        len: usize,
        /// Maximum accepted length in bytes
        limit: usize,
    },

    /// A history record could not be decoded
    #[error("Unable to decode history item on line {line}: {source}")]
    HistoryRecord {
        /// 1-based line number in the history file
        line: usize,
        /// Underlying decode error
        source: serde_json::Error,
    },

    /// A channel between the interaction task and a background task closed
    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

/// Result type alias for shell operations
pub type Result<T> = std::result::Result<T, ShellError>;

impl ShellError {
    /// Create a history location error
    pub fn history_location(msg: impl Into<String>) -> Self {
        Self::HistoryLocation(msg.into())
    }

    /// Create a channel closed error
    pub fn channel_closed(msg: impl Into<String>) -> Self {
        Self::ChannelClosed(msg.into())
    }
}
