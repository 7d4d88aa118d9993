//! Input modes
//!
//! Exactly one [`Mode`] is active at a time. Every key first goes to the
//! focused input for editing, then to the active mode, which may mutate the
//! session, push effects and switch to another mode. Switching runs the old
//! mode's `leave`, commits the new mode, then runs its `enter`.
//!
//! ```text
//!                  ┌──────── tab ───────▶ AutoComplete ─┐
//!                  │                                    │ accept/cancel/other
//!   CommandEntry ◀─┴────────────────────────────────────┘
//!     │  ▲   │ ▲
//!     │  │   │ └──── cancel/down ──── HistoryLookback ◀── up
//!     │  │   └────── ctrl+r ────────▶ HistorySearch
//!     │  └── finished ── CommandRunning ◀── enter (from entry, lookback, search)
//! ```

mod autocomplete;
mod command_entry;
mod command_running;
mod history_lookback;
mod history_search;

use crossterm::event::KeyEvent;

use crate::session::{Effect, HelpEntry, ModeKind, Overlay, ShellSession};

pub(crate) use autocomplete::AutoCompleteMode;
pub(crate) use command_entry::CommandEntryMode;
pub(crate) use command_running::CommandRunningMode;
pub(crate) use history_lookback::HistoryLookbackMode;
pub(crate) use history_search::HistorySearchMode;

/// Non-key events a mode may react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModeEvent {
    /// A completion answer was applied, with this many options
    CompletionReady(usize),
    /// The single completion option should be accepted
    SingleCompletion,
}

/// Behaviour shared by every mode
pub(crate) trait ModeBehavior {
    /// Called after the mode has been committed
    fn enter(&self, _session: &mut ShellSession, _effects: &mut Vec<Effect>) {}

    /// Called before the next mode is committed
    fn leave(&self, _session: &mut ShellSession, _effects: &mut Vec<Effect>) {}

    /// Handle a key after the focused input has seen it
    fn handle_key(&self, session: &mut ShellSession, key: KeyEvent, effects: &mut Vec<Effect>);

    /// Handle a non-key event
    fn handle_event(&self, _session: &mut ShellSession, _event: ModeEvent, _effects: &mut Vec<Effect>) {}

    /// Content shown below the input
    fn overlay(&self, _session: &ShellSession) -> Option<Overlay> {
        None
    }

    /// Key help on one line
    fn short_help(&self, session: &ShellSession) -> Vec<HelpEntry>;

    /// Key help grouped in columns
    fn full_help(&self, session: &ShellSession) -> Vec<Vec<HelpEntry>> {
        vec![self.short_help(session)]
    }
}

/// The active input mode
#[derive(Debug, Clone)]
pub(crate) enum Mode {
    CommandEntry(CommandEntryMode),
    CommandRunning(CommandRunningMode),
    AutoComplete(AutoCompleteMode),
    HistoryLookback(HistoryLookbackMode),
    HistorySearch(HistorySearchMode),
}

impl Mode {
    /// Command entry, restoring the drafted line
    pub(crate) const fn command_entry() -> Self {
        Self::CommandEntry(CommandEntryMode { keep_input: false })
    }

    /// Command entry, keeping whatever is in the input
    pub(crate) const fn command_entry_keeping_input() -> Self {
        Self::CommandEntry(CommandEntryMode { keep_input: true })
    }

    pub(crate) const fn command_running() -> Self {
        Self::CommandRunning(CommandRunningMode)
    }

    pub(crate) const fn autocomplete() -> Self {
        Self::AutoComplete(AutoCompleteMode)
    }

    /// History lookback, replaying `trigger` once entered
    pub(crate) const fn history_lookback(trigger: Option<KeyEvent>) -> Self {
        Self::HistoryLookback(HistoryLookbackMode { trigger })
    }

    pub(crate) const fn history_search() -> Self {
        Self::HistorySearch(HistorySearchMode)
    }

    pub(crate) const fn kind(&self) -> ModeKind {
        match self {
            Self::CommandEntry(_) => ModeKind::CommandEntry,
            Self::CommandRunning(_) => ModeKind::CommandRunning,
            Self::AutoComplete(_) => ModeKind::AutoComplete,
            Self::HistoryLookback(_) => ModeKind::HistoryLookback,
            Self::HistorySearch(_) => ModeKind::HistorySearch,
        }
    }

    pub(crate) fn behavior(&self) -> &dyn ModeBehavior {
        match self {
            Self::CommandEntry(mode) => mode,
            Self::CommandRunning(mode) => mode,
            Self::AutoComplete(mode) => mode,
            Self::HistoryLookback(mode) => mode,
            Self::HistorySearch(mode) => mode,
        }
    }
}
