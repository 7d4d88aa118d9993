//! Key bindings used by the shell
//!
//! A [`KeyMap`] maps every logical action of the shell to one or more key
//! chords. The [`Default`] keymap mirrors common readline conventions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A single logical key binding with its help text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    keys: Vec<(KeyCode, KeyModifiers)>,
    help_key: String,
    help_description: String,
}

impl KeyBinding {
    /// Create a binding for the given chords
    ///
    /// # Arguments
    /// * `keys` - Key chords which trigger the binding
    /// * `help_key` - Short label for the keys (e.g. `ctrl+c/esc`)
    /// * `help_description` - What the binding does
    pub fn new(
        keys: impl IntoIterator<Item = (KeyCode, KeyModifiers)>,
        help_key: impl Into<String>,
        help_description: impl Into<String>,
    ) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|(code, modifiers)| normalize(code, modifiers))
                .collect(),
            help_key: help_key.into(),
            help_description: help_description.into(),
        }
    }

    /// Returns true if the key event triggers this binding
    #[must_use]
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let pressed = normalize(event.code, event.modifiers);
        self.keys.iter().any(|chord| *chord == pressed)
    }

    /// Copy of this binding with a different help description
    #[must_use]
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Self {
            help_description: description.into(),
            ..self.clone()
        }
    }

    /// Key chords which trigger the binding
    #[must_use]
    pub fn keys(&self) -> &[(KeyCode, KeyModifiers)] {
        &self.keys
    }

    /// Help label for the keys
    #[must_use]
    pub fn help_key(&self) -> &str {
        &self.help_key
    }

    /// Help description of the action
    #[must_use]
    pub fn help_description(&self) -> &str {
        &self.help_description
    }
}

/// Shift is already encoded in the character (or implied by back-tab)
fn normalize(code: KeyCode, modifiers: KeyModifiers) -> (KeyCode, KeyModifiers) {
    match code {
        KeyCode::Char(_) | KeyCode::BackTab => (code, modifiers.difference(KeyModifiers::SHIFT)),
        _ => (code, modifiers),
    }
}

/// A collection of all the key bindings used by the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    /// Look back in the command history (also moves up a row of suggestions)
    pub up: KeyBinding,
    /// Look forward in the command history (also moves down a row of suggestions)
    pub down: KeyBinding,
    /// Move to the previous column of suggestions
    pub left: KeyBinding,
    /// Move to the next column of suggestions
    pub right: KeyBinding,
    /// Execute the current command
    pub execute: KeyBinding,
    /// Cancel whatever is currently happening
    ///
    /// The behaviour depends on what the user is doing:
    ///
    /// 1. If a command is being run, it cancels the command
    /// 2. If the user is searching or looking back, it returns to the prompt
    /// 3. If the user has typed a partial command, it clears the input
    /// 4. Otherwise it exits the shell
    pub cancel: KeyBinding,
    /// Search the command history backwards
    pub search_backward: KeyBinding,
    /// Search the command history forwards
    pub search_forward: KeyBinding,
    /// Autocomplete the current command, or cycle forward through suggestions
    pub complete: KeyBinding,
    /// Cycle backwards through suggestions
    pub previous_complete: KeyBinding,
}

impl Default for KeyMap {
    fn default() -> Self {
        let none = KeyModifiers::NONE;
        let ctrl = KeyModifiers::CONTROL;

        Self {
            up: KeyBinding::new([(KeyCode::Up, none)], "↑", "history up"),
            down: KeyBinding::new([(KeyCode::Down, none)], "↓", "history down"),
            left: KeyBinding::new([(KeyCode::Left, none)], "←", "previous column"),
            right: KeyBinding::new([(KeyCode::Right, none)], "→", "next column"),
            execute: KeyBinding::new([(KeyCode::Enter, none)], "enter", "execute command"),
            cancel: KeyBinding::new(
                [(KeyCode::Char('c'), ctrl), (KeyCode::Esc, none)],
                "ctrl+c/esc",
                "cancel",
            ),
            search_backward: KeyBinding::new(
                [(KeyCode::Char('r'), ctrl)],
                "ctrl+r",
                "history search",
            ),
            search_forward: KeyBinding::new(
                [(KeyCode::Char('s'), ctrl)],
                "ctrl+s",
                "history search (forward)",
            ),
            complete: KeyBinding::new([(KeyCode::Tab, none)], "tab", "autocomplete"),
            previous_complete: KeyBinding::new(
                [(KeyCode::BackTab, none)],
                "shift+tab",
                "previous autocomplete",
            ),
        }
    }
}

impl KeyMap {
    /// Returns true if the event triggers any binding in the map
    #[must_use]
    pub fn is_bound(&self, event: &KeyEvent) -> bool {
        [
            &self.up,
            &self.down,
            &self.left,
            &self.right,
            &self.execute,
            &self.cancel,
            &self.search_backward,
            &self.search_forward,
            &self.complete,
            &self.previous_complete,
        ]
        .into_iter()
        .any(|binding| binding.matches(event))
    }
}
