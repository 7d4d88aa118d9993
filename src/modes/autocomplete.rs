use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::completion::Directive;
use crate::session::{Effect, HelpEntry, LineInput, Message, Overlay, ShellSession};

use super::{Mode, ModeBehavior, ModeEvent};

/// Choosing one of the router's completion candidates
#[derive(Debug, Clone, Copy)]
pub(crate) struct AutoCompleteMode;

impl AutoCompleteMode {
    /// Replace the word before the cursor with the highlighted candidate
    fn accept(session: &mut ShellSession, effects: &mut Vec<Effect>) {
        if let Some(candidate) = session.completion.accept() {
            let candidate = candidate.to_string();
            let before = session.input.before_cursor();
            let after = session.input.after_cursor().to_string();
            let word_start = before.rfind(' ').map_or(0, |index| index + 1);

            let mut value = before[..word_start].to_string();
            value.push_str(&candidate);
            if !session.completion.directive().contains(Directive::NO_SPACE) {
                value.push(' ');
            }
            let cursor = value.chars().count();
            value.push_str(&after);

            session.input.set_value_with_cursor(value, cursor);
        }

        session.enter_mode(Mode::command_entry_keeping_input(), effects);
    }
}

impl ModeBehavior for AutoCompleteMode {
    fn enter(&self, session: &mut ShellSession, effects: &mut Vec<Effect>) {
        session.input.blur();
        let line = session.input.before_cursor().to_string();
        effects.push(Effect::Complete(session.completion.begin(line)));
    }

    fn leave(&self, session: &mut ShellSession, _effects: &mut Vec<Effect>) {
        session.completion.clear();
    }

    fn handle_key(&self, session: &mut ShellSession, key: KeyEvent, effects: &mut Vec<Effect>) {
        let options = Arc::clone(&session.options);
        let keymap = &options.keymap;
        let is_space = key.code == KeyCode::Char(' ')
            && !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

        if keymap.complete.matches(&key) {
            session.completion.next_result();
        } else if keymap.previous_complete.matches(&key) {
            session.completion.previous_result();
        } else if keymap.up.matches(&key) {
            session.completion.previous_row();
        } else if keymap.down.matches(&key) {
            session.completion.next_row();
        } else if keymap.left.matches(&key) {
            session.completion.previous_column();
        } else if keymap.right.matches(&key) {
            session.completion.next_column();
        } else if keymap.cancel.matches(&key) {
            session.enter_mode(Mode::command_entry_keeping_input(), effects);
        } else if keymap.execute.matches(&key) || is_space {
            Self::accept(session, effects);
        } else {
            session.enter_mode(Mode::command_entry_keeping_input(), effects);
            // type-through: replay keys command entry understands
            if LineInput::is_editing_key(&key) || keymap.is_bound(&key) {
                session.dispatch_key(key, effects);
            }
        }
    }

    fn handle_event(&self, session: &mut ShellSession, event: ModeEvent, effects: &mut Vec<Effect>) {
        match event {
            ModeEvent::CompletionReady(0) => {
                session.enter_mode(Mode::command_entry_keeping_input(), effects);
            }
            ModeEvent::CompletionReady(1) => {
                effects.push(Effect::Emit(Message::SingleCompletion {
                    id: session.completion.id(),
                    seq: session.completion.seq(),
                }));
            }
            ModeEvent::CompletionReady(_) => {}
            ModeEvent::SingleCompletion => Self::accept(session, effects),
        }
    }

    fn overlay(&self, session: &ShellSession) -> Option<Overlay> {
        session.completion.layout().map(Overlay::Suggestions)
    }

    fn short_help(&self, session: &ShellSession) -> Vec<HelpEntry> {
        let keymap = &session.options.keymap;
        vec![
            (&keymap.complete).into(),
            (&keymap.previous_complete).into(),
            keymap.execute.with_description("accept").into(),
            (&keymap.cancel).into(),
        ]
    }
}
