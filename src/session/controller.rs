//! Message handling and mode plumbing for [`ShellSession`]

use chrono::Utc;
use crossterm::event::{KeyEvent, KeyEventKind};

use crate::history::{HistoryItem, ItemStatus, RenderSettings, render_item};
use crate::modes::{Mode, ModeEvent};

use super::effect::Effect;
use super::message::{InputEvent, Message};
use super::view::{HistoryBlock, ViewModel};
use super::ShellSession;

// ============================================================================
// Public API
// ============================================================================

impl ShellSession {
    /// Enter the initial mode and request the history load
    ///
    /// Calling it again has no effect.
    pub fn init(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.mode.is_some() {
            return effects;
        }

        self.enter_mode(Mode::command_entry(), &mut effects);
        if self.options.history_file.is_some() {
            effects.push(Effect::LoadHistory {
                id: self.history.id(),
            });
        }
        effects
    }

    /// Apply one message
    ///
    /// # Returns
    /// The effects to carry out, in order
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::Input(InputEvent::Resize { width, height }) => {
                self.width = width;
                self.height = height;
                self.sized = true;
                self.completion
                    .resize(usize::from(width), usize::from(height));
            }
            Message::Input(InputEvent::Key(key)) => self.handle_key(key, &mut effects),
            Message::Shutdown { id } if self.id.matches(id) => self.shutdown(&mut effects),
            Message::HistoryLoaded { id, items } if self.history.id().matches(id) => {
                log::debug!("Restoring {} history items", items.len());
                self.history.restore(items);
            }
            Message::HistoryItemAdded { id, item } if self.history.id().matches(id) => {
                let persist = item.is_command();
                let snapshot = self.history.append(item);
                if persist {
                    self.push_save(snapshot, &mut effects);
                }
            }
            Message::CommandOutput { id, item_id, chunk } if self.id.matches(id) => {
                if let Some(item) = self.history.get_mut(item_id) {
                    item.streaming_output.push_str(&chunk);
                }
            }
            Message::CommandFinished { id, item } if self.id.matches(id) => {
                self.finish_command(item, &mut effects);
            }
            Message::CompletionReady { id, seq, result } if self.completion.id().matches(id) => {
                if let Some(count) = self.completion.apply(seq, result) {
                    self.dispatch_event(ModeEvent::CompletionReady(count), &mut effects);
                }
            }
            Message::SingleCompletion { id, seq } if self.completion.id().matches(id) => {
                if self.completion.is_current(seq) {
                    self.dispatch_event(ModeEvent::SingleCompletion, &mut effects);
                } else {
                    log::debug!("Dropping stale single completion {seq} (current {})", self.completion.seq());
                }
            }
            other => log::debug!("Session {} dropping message for another instance: {other:?}", self.id),
        }

        effects
    }

    /// Project the current state into a view-model
    #[must_use]
    pub fn view(&self) -> ViewModel {
        let mode = self.mode.as_ref();
        let overlay = if self.shutting_down {
            None
        } else {
            mode.and_then(|mode| mode.behavior().overlay(self))
        };
        let overlay_height = overlay.as_ref().map_or(0, |overlay| overlay.lines().len());

        ViewModel {
            mode: mode.map(Mode::kind),
            ready: self.sized,
            shutting_down: self.shutting_down,
            width: self.width,
            height: self.height,
            history: self.history_blocks(usize::from(self.height).saturating_sub(1 + overlay_height)),
            prompt: self.input.prompt().to_string(),
            input: self.input.value().to_string(),
            placeholder: self.options.placeholder.clone(),
            cursor: self.input.cursor(),
            show_input: !self.shutting_down && !self.waiting_inline(),
            overlay,
            short_help: mode.map(|mode| mode.behavior().short_help(self)).unwrap_or_default(),
            full_help: mode.map(|mode| mode.behavior().full_help(self)).unwrap_or_default(),
        }
    }
}

// ============================================================================
// Mode plumbing
// ============================================================================

impl ShellSession {
    /// Leave the current mode and enter `mode`
    pub(crate) fn enter_mode(&mut self, mode: Mode, effects: &mut Vec<Effect>) {
        if let Some(previous) = self.mode.take() {
            log::debug!("Session {} leaving {:?} for {:?}", self.id, previous.kind(), mode.kind());
            previous.behavior().leave(self, effects);
        }

        self.mode = Some(mode.clone());
        mode.behavior().enter(self, effects);
    }

    /// Route a key to the focused input, then to the active mode
    pub(crate) fn dispatch_key(&mut self, key: KeyEvent, effects: &mut Vec<Effect>) {
        if self.input.is_focused() {
            self.input.handle_key(&key);
        } else if self.search_input.is_focused() {
            self.search_input.handle_key(&key);
        }

        if let Some(mode) = self.mode.clone() {
            mode.behavior().handle_key(self, key, effects);
        }
    }

    /// Submit a line for execution
    ///
    /// Blank lines are ignored and `exit`/`quit` shut the session down.
    pub(crate) fn submit_line(&mut self, line: &str, effects: &mut Vec<Effect>) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line == "exit" || line == "quit" {
            self.shutdown(effects);
            return;
        }

        let item = HistoryItem::new(self.input.prompt(), line, ItemStatus::Running);
        self.input.clear();
        self.lookback_partial.clear();
        self.enter_mode(Mode::command_running(), effects);

        let snapshot = self.history.append(item.clone());
        self.push_save(snapshot, effects);
        effects.push(Effect::Execute(self.execution.start(item)));
    }

    /// Stop accepting input and ask the host to quit
    pub(crate) fn shutdown(&mut self, effects: &mut Vec<Effect>) {
        if self.shutting_down {
            return;
        }
        log::debug!("Session {} shutting down", self.id);

        self.shutting_down = true;
        self.execution.cancel();
        effects.push(Effect::Quit);
    }

    /// Show the history item at `lookback` in the input
    pub(crate) fn show_lookback(&mut self, lookback: usize) {
        self.lookback = lookback;
        let line = self.history.line_at(lookback).to_string();
        self.input.set_value(line);
    }

    /// Copy the shown history line into the input and go back to editing
    ///
    /// A left arrow is replayed so it moves the cursor.
    pub(crate) fn take_shown_line(&mut self, key: KeyEvent, effects: &mut Vec<Effect>) {
        if self.lookback > 0 {
            let line = self.history.line_at(self.lookback).to_string();
            self.input.set_value(line);
        }

        self.enter_mode(Mode::command_entry_keeping_input(), effects);
        if self.options.keymap.left.matches(&key) {
            self.dispatch_key(key, effects);
        }
    }

    fn handle_key(&mut self, key: KeyEvent, effects: &mut Vec<Effect>) {
        if key.kind == KeyEventKind::Release || self.shutting_down {
            return;
        }
        self.dispatch_key(key, effects);
    }

    fn dispatch_event(&mut self, event: ModeEvent, effects: &mut Vec<Effect>) {
        if let Some(mode) = self.mode.clone() {
            mode.behavior().handle_event(self, event, effects);
        }
    }

    fn finish_command(&mut self, mut item: HistoryItem, effects: &mut Vec<Effect>) {
        log::debug!("Command {:?} finished with {:?}", item.line, item.status);
        self.execution.finish();

        if self.options.inline && item.is_finished() {
            item.loaded = true;
            effects.push(Effect::Print(render_item(&item, &self.render_settings())));
        }

        let snapshot = self.history.update(item);
        self.push_save(snapshot, effects);

        if matches!(self.mode, Some(Mode::CommandRunning(_))) {
            self.lookback_partial.clear();
            self.enter_mode(Mode::command_entry(), effects);
        }
    }

    fn push_save(&self, snapshot: Vec<HistoryItem>, effects: &mut Vec<Effect>) {
        if self.options.history_file.is_some() {
            effects.push(Effect::SaveHistory {
                id: self.history.id(),
                snapshot,
            });
        }
    }
}

// ============================================================================
// View helpers
// ============================================================================

impl ShellSession {
    fn render_settings(&self) -> RenderSettings<'_> {
        RenderSettings {
            width: usize::from(self.width),
            now: Utc::now(),
            max_stack_frames: self.options.max_stack_frames,
            stack_frame_filters: &self.options.stack_frame_filters,
        }
    }

    /// Render the history blocks that fit in `rows`, newest last
    fn history_blocks(&self, rows: usize) -> Vec<HistoryBlock> {
        let settings = self.render_settings();
        let block = |item: &HistoryItem| HistoryBlock {
            id: item.id,
            kind: item.kind,
            status: item.status,
            text: render_item(item, &settings),
        };

        if self.options.inline {
            return self
                .history
                .items()
                .filter(|item| !item.loaded)
                .map(block)
                .collect();
        }

        let mut blocks = Vec::new();
        let mut used = 0;
        for item in self.history.items().rev() {
            if used >= rows {
                break;
            }
            let rendered = block(item);
            used += rendered.text.split('\n').count();
            blocks.push(rendered);
        }
        blocks.reverse();
        blocks
    }

    /// Inline shells hide the input while the newest command runs
    fn waiting_inline(&self) -> bool {
        self.options.inline
            && self
                .history
                .lookback(1)
                .is_some_and(|item| !item.loaded && item.is_command() && !item.is_finished())
    }
}
