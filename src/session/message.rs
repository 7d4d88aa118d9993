//! Inbound messages for the session

use crossterm::event::KeyEvent;

use crate::completion::CompletionResult;
use crate::history::HistoryItem;
use crate::types::{ItemId, SessionId};

/// Input delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press, repeat or release
    Key(KeyEvent),
    /// The space available to the shell changed
    Resize {
        /// Width in columns
        width: u16,
        /// Height in rows
        height: u16,
    },
}

/// Everything the session reacts to
///
/// Messages produced by background work carry the id of the instance they
/// are addressed to (the session, its history store, or its completion
/// model); a session drops messages whose id does not match.
#[derive(Debug)]
pub enum Message {
    /// Host input
    Input(InputEvent),
    /// Shut the session down
    Shutdown {
        /// Session id
        id: SessionId,
    },
    /// The history file finished loading
    HistoryLoaded {
        /// History store id
        id: SessionId,
        /// Loaded items, oldest first
        items: Vec<HistoryItem>,
    },
    /// Add an item produced by a background task (e.g. a failed save)
    HistoryItemAdded {
        /// History store id
        id: SessionId,
        /// Item to append
        item: HistoryItem,
    },
    /// A chunk of output from the running command
    CommandOutput {
        /// Session id
        id: SessionId,
        /// Item the output belongs to
        item_id: ItemId,
        /// Output text
        chunk: String,
    },
    /// The running command finished
    CommandFinished {
        /// Session id
        id: SessionId,
        /// Updated history item
        item: HistoryItem,
    },
    /// A completion query answered
    CompletionReady {
        /// Completion model id
        id: SessionId,
        /// Query sequence number
        seq: u64,
        /// Parsed answer
        result: CompletionResult,
    },
    /// Exactly one completion option was found and should be accepted
    SingleCompletion {
        /// Completion model id
        id: SessionId,
        /// Sequence number of the query which found the option
        seq: u64,
    },
}

impl Message {
    /// Wrap a key event
    #[must_use]
    pub const fn key(event: KeyEvent) -> Self {
        Self::Input(InputEvent::Key(event))
    }

    /// Wrap a resize event
    #[must_use]
    pub const fn resize(width: u16, height: u16) -> Self {
        Self::Input(InputEvent::Resize { width, height })
    }
}
