//! Outbound effects requested by the session

use crate::completion::CompletionRequest;
use crate::execution::ExecutionRequest;
use crate::history::HistoryItem;
use crate::types::SessionId;

use super::message::Message;

/// Work the session wants done outside the interaction task
///
/// Effects are returned in the order they were produced and must be
/// interpreted in that order.
#[derive(Debug)]
pub enum Effect {
    /// Load the history file and answer with [`Message::HistoryLoaded`]
    LoadHistory {
        /// History store id
        id: SessionId,
    },
    /// Persist a history snapshot
    SaveHistory {
        /// History store id, for reporting failures
        id: SessionId,
        /// Items to write, oldest first
        snapshot: Vec<HistoryItem>,
    },
    /// Run a command
    Execute(ExecutionRequest),
    /// Query the router for completions and answer with
    /// [`Message::CompletionReady`]
    Complete(CompletionRequest),
    /// Feed a message back into the session
    Emit(Message),
    /// Print text above the managed view (inline mode)
    Print(String),
    /// The session is over
    Quit,
}
