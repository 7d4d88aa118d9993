//! History items

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ItemId;

/// Execution status of a history item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Status not recorded
    #[default]
    Unknown,
    /// The command is still executing
    Running,
    /// The command finished without error
    Success,
    /// The command returned an error
    Error,
}

/// What a history item represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemKind {
    /// A command entered by the user
    #[default]
    Command,
    /// An error encountered by the shell itself
    InternalError,
    /// Separator between restored history and the current session
    HistoryRestored,
}

/// One entry in the command history
///
/// Only `id`, `prompt`, `line`, `started`, `finished`, `status` and `output`
/// are persisted; the remaining fields live for the current session only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Unique, time-sortable identifier
    pub id: ItemId,
    /// Prompt shown when the command was entered
    #[serde(default)]
    pub prompt: String,
    /// The command line
    pub line: String,
    /// When execution started
    pub started: DateTime<Utc>,
    /// When execution finished, `None` while running
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
    /// Execution status
    #[serde(default)]
    pub status: ItemStatus,
    /// Full trimmed output, set when execution finishes
    #[serde(default)]
    pub output: String,

    /// Output received so far while the command runs
    #[serde(skip)]
    pub streaming_output: String,
    /// What the item represents
    #[serde(skip)]
    pub kind: ItemKind,
    /// True if the item was restored from a previous session
    #[serde(skip)]
    pub loaded: bool,
    /// Error returned by the command
    #[serde(skip)]
    pub error: Option<Arc<anyhow::Error>>,
}

impl HistoryItem {
    /// Create a command item started now
    pub fn new(prompt: impl Into<String>, line: impl Into<String>, status: ItemStatus) -> Self {
        Self {
            id: ItemId::new(),
            prompt: prompt.into(),
            line: line.into(),
            started: Utc::now(),
            finished: None,
            status,
            output: String::new(),
            streaming_output: String::new(),
            kind: ItemKind::Command,
            loaded: false,
            error: None,
        }
    }

    /// Create an item reporting an error inside the shell
    pub fn internal_error(line: impl Into<String>, error: anyhow::Error) -> Self {
        let mut item = Self::new("", line, ItemStatus::Error);
        item.kind = ItemKind::InternalError;
        item.error = Some(Arc::new(error));
        item
    }

    /// Create the separator placed after restored history
    #[must_use]
    pub fn restored_marker() -> Self {
        let mut item = Self::new("", "restored history from previous session", ItemStatus::Success);
        item.kind = ItemKind::HistoryRestored;
        item.loaded = true;
        item
    }

    /// Returns true for commands entered by the user
    #[must_use]
    pub fn is_command(&self) -> bool {
        self.kind == ItemKind::Command
    }

    /// Returns true once execution has finished
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Time taken to execute, if finished
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished.map(|finished| finished - self.started)
    }
}
