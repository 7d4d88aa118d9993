//! View-model handed to renderers

use unicode_width::UnicodeWidthStr;

use crate::completion::SuggestionList;
use crate::history::{ItemKind, ItemStatus};
use crate::types::{ItemId, KeyBinding};

/// Which input mode the session is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    /// Typing a command
    CommandEntry,
    /// Waiting for a command to finish
    CommandRunning,
    /// Choosing a completion
    AutoComplete,
    /// Stepping through previous commands
    HistoryLookback,
    /// Incremental history search
    HistorySearch,
}

/// A key and what it does
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// Key label, e.g. `ctrl+c/esc`
    pub key: String,
    /// Action label
    pub description: String,
}

impl From<&KeyBinding> for HelpEntry {
    fn from(binding: &KeyBinding) -> Self {
        Self {
            key: binding.help_key().to_string(),
            description: binding.help_description().to_string(),
        }
    }
}

impl From<KeyBinding> for HelpEntry {
    fn from(binding: KeyBinding) -> Self {
        Self::from(&binding)
    }
}

/// A rendered history item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryBlock {
    /// Item id
    pub id: ItemId,
    /// What the item represents
    pub kind: ItemKind,
    /// Execution status
    pub status: ItemStatus,
    /// Plain-text lines, joined by `\n`
    pub text: String,
}

/// Mode-specific content shown below the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    /// Completion suggestions
    Suggestions(SuggestionList),
    /// History search prompt and query
    Search {
        /// `bck-i-search: ` and friends
        prompt: String,
        /// Search text
        query: String,
        /// Cursor within the query, in characters
        cursor: usize,
    },
}

impl Overlay {
    /// Plain-text rendering
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Suggestions(list) => list.lines(),
            Self::Search { prompt, query, .. } => vec![format!("{prompt}{query}")],
        }
    }
}

/// Everything a renderer needs to draw the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    /// Active mode, `None` before initialisation
    pub mode: Option<ModeKind>,
    /// False until the first resize arrives
    pub ready: bool,
    /// True once the session is shutting down
    pub shutting_down: bool,
    /// Width in columns
    pub width: u16,
    /// Height in rows
    pub height: u16,
    /// History blocks that fit on screen, newest last
    pub history: Vec<HistoryBlock>,
    /// Prompt before the input
    pub prompt: String,
    /// Input text
    pub input: String,
    /// Shown in place of an empty input
    pub placeholder: String,
    /// Cursor position within the input, in characters
    pub cursor: usize,
    /// Whether to draw the input line at all
    pub show_input: bool,
    /// Mode-specific content below the input
    pub overlay: Option<Overlay>,
    /// Key help for a single line
    pub short_help: Vec<HelpEntry>,
    /// Key help grouped in columns
    pub full_help: Vec<Vec<HelpEntry>>,
}

impl ViewModel {
    /// Compose the view as plain-text lines
    ///
    /// History comes first, trimmed from the top so that input and overlay
    /// stay on screen, followed by the input line and the overlay.
    #[must_use]
    pub fn lines(&self, inline: bool) -> Vec<String> {
        if self.mode.is_none() {
            return Vec::new();
        }
        if !self.ready {
            return vec!["Waiting for window size...".to_string()];
        }

        let mut footer = Vec::new();
        if !self.shutting_down {
            if self.show_input {
                let text = if self.input.is_empty() {
                    &self.placeholder
                } else {
                    &self.input
                };
                footer.push(format!("{}{text}", self.prompt));
            }
            if let Some(overlay) = &self.overlay {
                footer.extend(overlay.lines());
            }
        }

        let mut history: Vec<String> = self
            .history
            .iter()
            .flat_map(|block| block.text.split('\n').map(ToString::to_string))
            .collect();

        if !inline {
            let room = usize::from(self.height).saturating_sub(footer.len());
            if history.len() > room {
                history.drain(..history.len() - room);
            }
        }

        history.extend(footer);
        history
    }

    /// Column of the cursor on the input line
    #[must_use]
    pub fn cursor_column(&self) -> usize {
        let before: String = self.input.chars().take(self.cursor).collect();
        self.prompt.width() + before.width()
    }
}
