use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::session::{Effect, HelpEntry, ShellSession};

use super::{Mode, ModeBehavior};

/// Free-text command entry, the initial mode
#[derive(Debug, Clone, Copy)]
pub(crate) struct CommandEntryMode {
    /// Keep the current input instead of restoring the drafted line
    pub(crate) keep_input: bool,
}

impl ModeBehavior for CommandEntryMode {
    fn enter(&self, session: &mut ShellSession, _effects: &mut Vec<Effect>) {
        let draft = std::mem::take(&mut session.lookback_partial);
        if !self.keep_input {
            session.input.set_value(draft);
        }

        let prompt = session.options.render_prompt();
        session.input.set_prompt(prompt);
        session.input.focus();
    }

    fn leave(&self, session: &mut ShellSession, _effects: &mut Vec<Effect>) {
        session.lookback_partial = session.input.value().to_string();
        session.input.blur();
    }

    fn handle_key(&self, session: &mut ShellSession, key: KeyEvent, effects: &mut Vec<Effect>) {
        let options = Arc::clone(&session.options);
        let keymap = &options.keymap;

        if keymap.execute.matches(&key) {
            let line = session.input.value().to_string();
            session.submit_line(&line, effects);
        } else if keymap.up.matches(&key) && !session.history.is_empty() {
            session.enter_mode(Mode::history_lookback(Some(key)), effects);
        } else if keymap.search_backward.matches(&key) && !session.history.is_empty() {
            session.enter_mode(Mode::history_search(), effects);
        } else if keymap.complete.matches(&key) {
            session.enter_mode(Mode::autocomplete(), effects);
        } else if keymap.cancel.matches(&key) {
            if session.input.value().is_empty() {
                session.shutdown(effects);
            } else {
                session.input.clear();
            }
        }
    }

    fn short_help(&self, session: &ShellSession) -> Vec<HelpEntry> {
        let keymap = &session.options.keymap;
        let cancel = if session.input.value().is_empty() {
            keymap.cancel.with_description("exit")
        } else {
            keymap.cancel.with_description("clear input")
        };

        vec![
            (&keymap.up).into(),
            (&keymap.search_backward).into(),
            (&keymap.complete).into(),
            (&keymap.execute).into(),
            cancel.into(),
        ]
    }
}
