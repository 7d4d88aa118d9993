use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::session::{Effect, HelpEntry, ShellSession};

use super::{Mode, ModeBehavior};

/// Stepping through previous commands with up and down
#[derive(Debug, Clone, Copy)]
pub(crate) struct HistoryLookbackMode {
    /// Key which opened the mode, replayed once entered
    pub(crate) trigger: Option<KeyEvent>,
}

impl ModeBehavior for HistoryLookbackMode {
    fn enter(&self, session: &mut ShellSession, effects: &mut Vec<Effect>) {
        session.lookback = 0;
        if let Some(trigger) = self.trigger {
            session.dispatch_key(trigger, effects);
        }
    }

    fn handle_key(&self, session: &mut ShellSession, key: KeyEvent, effects: &mut Vec<Effect>) {
        let options = Arc::clone(&session.options);
        let keymap = &options.keymap;

        if keymap.execute.matches(&key) {
            let line = session.input.value().to_string();
            session.submit_line(&line, effects);
        } else if keymap.up.matches(&key) {
            match session.history.next_distinct(session.lookback, true) {
                Some(lookback) => session.show_lookback(lookback),
                None if session.lookback == 0 => {
                    session.enter_mode(Mode::command_entry(), effects);
                }
                None => {}
            }
        } else if keymap.down.matches(&key) {
            match session.history.next_distinct(session.lookback, false) {
                Some(lookback) => session.show_lookback(lookback),
                None => session.enter_mode(Mode::command_entry(), effects),
            }
        } else if keymap.cancel.matches(&key) {
            session.enter_mode(Mode::command_entry(), effects);
        } else if keymap.left.matches(&key)
            || keymap.right.matches(&key)
            || keymap.complete.matches(&key)
        {
            session.take_shown_line(key, effects);
        }
    }

    fn short_help(&self, session: &ShellSession) -> Vec<HelpEntry> {
        let keymap = &session.options.keymap;
        vec![
            (&keymap.up).into(),
            (&keymap.down).into(),
            (&keymap.execute).into(),
            (&keymap.cancel).into(),
        ]
    }
}
