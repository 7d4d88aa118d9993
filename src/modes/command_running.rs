use crossterm::event::KeyEvent;

use crate::session::{Effect, HelpEntry, ShellSession};

use super::ModeBehavior;

/// A command is executing; the input is inert
#[derive(Debug, Clone, Copy)]
pub(crate) struct CommandRunningMode;

impl ModeBehavior for CommandRunningMode {
    fn handle_key(&self, session: &mut ShellSession, key: KeyEvent, effects: &mut Vec<Effect>) {
        if session.options.keymap.cancel.matches(&key) && !session.execution.cancel() {
            session.shutdown(effects);
        }
    }

    fn short_help(&self, session: &ShellSession) -> Vec<HelpEntry> {
        let cancel = &session.options.keymap.cancel;
        let cancel = if session.execution.is_active() {
            cancel.with_description("stop executing command")
        } else {
            cancel.with_description("quit")
        };
        vec![cancel.into()]
    }
}
