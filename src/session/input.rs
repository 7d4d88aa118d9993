//! Single-line input buffer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A single line of editable text with a cursor
///
/// Only reacts to keys while focused. The cursor is a character index.
#[derive(Debug, Clone, Default)]
pub struct LineInput {
    value: String,
    cursor: usize,
    focused: bool,
    prompt: String,
}

impl LineInput {
    /// Create an empty, unfocused input
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the text and move the cursor to the end
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor_end();
    }

    /// Replace the text and place the cursor at `cursor` (clamped)
    pub fn set_value_with_cursor(&mut self, value: impl Into<String>, cursor: usize) {
        self.value = value.into();
        self.cursor = cursor.min(self.len());
    }

    /// Clear the text
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Cursor position in characters
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Text before the cursor
    #[must_use]
    pub fn before_cursor(&self) -> &str {
        &self.value[..self.byte_index(self.cursor)]
    }

    /// Text from the cursor onwards
    #[must_use]
    pub fn after_cursor(&self) -> &str {
        &self.value[self.byte_index(self.cursor)..]
    }

    /// Move the cursor to the end
    pub fn cursor_end(&mut self) {
        self.cursor = self.len();
    }

    /// Start reacting to keys
    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Stop reacting to keys
    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Returns true if the input reacts to keys
    #[must_use]
    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    /// Prompt shown before the text
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Set the prompt
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Returns true for keys that insert text or edit the line
    #[must_use]
    pub fn is_editing_key(event: &KeyEvent) -> bool {
        match event.code {
            KeyCode::Char(_) => !event
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT),
            KeyCode::Backspace | KeyCode::Delete | KeyCode::Home | KeyCode::End => true,
            _ => false,
        }
    }

    /// Apply a key to the buffer
    ///
    /// # Returns
    /// `true` if the text changed
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if !self.focused {
            return false;
        }

        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        let alt = event.modifiers.contains(KeyModifiers::ALT);

        match event.code {
            KeyCode::Char(c) if !ctrl && !alt => {
                let at = self.byte_index(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            KeyCode::Char('a') if ctrl => {
                self.cursor = 0;
                false
            }
            KeyCode::Char('e') if ctrl => {
                self.cursor_end();
                false
            }
            KeyCode::Char('u') if ctrl => self.delete_range(0, self.cursor),
            KeyCode::Char('k') if ctrl => self.delete_range(self.cursor, self.len()),
            KeyCode::Char('w') if ctrl => self.delete_word_backward(),
            KeyCode::Backspace if alt || ctrl => self.delete_word_backward(),
            KeyCode::Backspace if self.cursor > 0 => self.delete_range(self.cursor - 1, self.cursor),
            KeyCode::Delete => self.delete_range(self.cursor, (self.cursor + 1).min(self.len())),
            KeyCode::Left if self.cursor > 0 => {
                self.cursor -= 1;
                false
            }
            KeyCode::Right if self.cursor < self.len() => {
                self.cursor += 1;
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor_end();
                false
            }
            _ => false,
        }
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.value
            .char_indices()
            .nth(cursor)
            .map_or(self.value.len(), |(index, _)| index)
    }

    fn delete_range(&mut self, start: usize, end: usize) -> bool {
        if start >= end {
            return false;
        }
        let (from, to) = (self.byte_index(start), self.byte_index(end));
        self.value.replace_range(from..to, "");
        self.cursor = start;
        true
    }

    fn delete_word_backward(&mut self) -> bool {
        let chars: Vec<char> = self.value.chars().take(self.cursor).collect();
        let mut start = chars.len();
        while start > 0 && chars[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !chars[start - 1].is_whitespace() {
            start -= 1;
        }
        self.delete_range(start, self.cursor)
    }
}
