use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::session::{Effect, HelpEntry, Overlay, ShellSession};

use super::{Mode, ModeBehavior};

/// Incremental, case-insensitive history search
#[derive(Debug, Clone, Copy)]
pub(crate) struct HistorySearchMode;

/// Prompt for the search input
pub(crate) const fn search_prompt(backwards: bool, found: bool) -> &'static str {
    match (found, backwards) {
        (true, true) => "bck-i-search: ",
        (true, false) => "fwd-i-search: ",
        (false, true) => "failing bck-i-search: ",
        (false, false) => "failing fwd-i-search: ",
    }
}

impl HistorySearchMode {
    fn search(session: &mut ShellSession, start: usize, delta: isize) {
        let term = session.search_input.value().to_string();
        if term.trim().is_empty() {
            session.search_found = true;
            return;
        }

        let (lookback, found) = session.history.search(&term, start, delta);
        session.search_found = found;
        if found {
            session.show_lookback(lookback);
        }
    }
}

impl ModeBehavior for HistorySearchMode {
    fn enter(&self, session: &mut ShellSession, _effects: &mut Vec<Effect>) {
        session.lookback = 0;
        session.search_backwards = true;
        session.search_found = true;
        session.last_search.clear();
        session.search_input.clear();
        session.search_input.focus();
    }

    fn leave(&self, session: &mut ShellSession, _effects: &mut Vec<Effect>) {
        session.last_search.clear();
        session.search_input.clear();
        session.search_input.blur();
    }

    fn handle_key(&self, session: &mut ShellSession, key: KeyEvent, effects: &mut Vec<Effect>) {
        let options = Arc::clone(&session.options);
        let keymap = &options.keymap;

        if keymap.execute.matches(&key) {
            let line = session.input.value().to_string();
            session.submit_line(&line, effects);
        } else if keymap.search_backward.matches(&key) {
            let start = session.lookback;
            session.search_backwards = true;
            Self::search(session, start, 1);
        } else if keymap.search_forward.matches(&key) {
            let start = session.lookback;
            session.search_backwards = false;
            Self::search(session, start, -1);
        } else if keymap.cancel.matches(&key) {
            session.enter_mode(Mode::command_entry(), effects);
        } else if keymap.left.matches(&key)
            || keymap.right.matches(&key)
            || keymap.complete.matches(&key)
        {
            session.take_shown_line(key, effects);
        } else if session.search_input.value() != session.last_search {
            session.last_search = session.search_input.value().to_string();
            Self::search(session, 0, 1);
        }
    }

    fn overlay(&self, session: &ShellSession) -> Option<Overlay> {
        Some(Overlay::Search {
            prompt: search_prompt(session.search_backwards, session.search_found).to_string(),
            query: session.search_input.value().to_string(),
            cursor: session.search_input.cursor(),
        })
    }

    fn short_help(&self, session: &ShellSession) -> Vec<HelpEntry> {
        let keymap = &session.options.keymap;
        vec![
            keymap.search_backward.with_description("search backwards").into(),
            keymap.search_forward.with_description("search forwards").into(),
            (&keymap.execute).into(),
            (&keymap.cancel).into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_reflect_direction_and_failure() {
        assert_eq!(search_prompt(true, true), "bck-i-search: ");
        assert_eq!(search_prompt(false, true), "fwd-i-search: ");
        assert_eq!(search_prompt(true, false), "failing bck-i-search: ");
        assert_eq!(search_prompt(false, false), "failing fwd-i-search: ");
    }
}
