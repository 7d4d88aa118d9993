//! Shell session state machine
//!
//! A [`ShellSession`] owns everything the user interacts with: the input
//! buffers, the active mode, the history, the completion suggestions and the
//! handle of the running command. It is a pure state machine: each call to
//! [`ShellSession::update`] applies one [`Message`] and returns the
//! [`Effect`]s the caller must carry out (run a command, save the history,
//! query completions, ...). Results of that work come back as messages.
//!
//! The [`runtime`](crate::runtime) module drives a session on a tokio task;
//! tests and custom hosts can drive it directly.
//!
//! # Example
//!
//! ```
//! use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
//! use kodegen_shell::{Effect, Message, ModeKind, ShellOptions, ShellSession};
//!
//! let mut session = ShellSession::new(ShellOptions::builder().no_history().build());
//! session.init();
//! session.update(Message::resize(80, 24));
//!
//! for c in "help".chars() {
//!     session.update(Message::key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
//! }
//! let effects = session.update(Message::key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
//!
//! assert_eq!(session.mode(), Some(ModeKind::CommandRunning));
//! assert!(effects.iter().any(|effect| matches!(effect, Effect::Execute(_))));
//! ```

mod controller;
mod effect;
mod input;
mod message;
mod view;

use std::sync::Arc;

use crate::completion::CompletionModel;
use crate::execution::ExecutionController;
use crate::history::HistoryStore;
use crate::modes::Mode;
use crate::types::{SessionId, ShellOptions};

pub use effect::Effect;
pub use input::LineInput;
pub use message::{InputEvent, Message};
pub use view::{HelpEntry, HistoryBlock, ModeKind, Overlay, ViewModel};

/// Interactive shell session
#[derive(Debug)]
pub struct ShellSession {
    pub(crate) id: SessionId,
    pub(crate) options: Arc<ShellOptions>,

    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) sized: bool,

    pub(crate) input: LineInput,
    pub(crate) search_input: LineInput,
    pub(crate) last_search: String,
    pub(crate) search_backwards: bool,
    pub(crate) search_found: bool,

    /// Offset of the history item shown in the input, 0 for none
    pub(crate) lookback: usize,
    /// Line drafted before entering lookback or search
    pub(crate) lookback_partial: String,

    pub(crate) shutting_down: bool,

    pub(crate) history: HistoryStore,
    pub(crate) completion: CompletionModel,
    pub(crate) execution: ExecutionController,

    pub(crate) mode: Option<Mode>,
}

impl ShellSession {
    /// Create a session
    ///
    /// Call [`init`](Self::init) before feeding it messages.
    pub fn new(options: impl Into<Arc<ShellOptions>>) -> Self {
        let options = options.into();
        let id = options.ids.next_id();
        let history = HistoryStore::new(options.ids.next_id());
        let completion = CompletionModel::new(options.ids.next_id(), id);
        let execution = ExecutionController::new(
            id,
            options.base_token.clone(),
            options.capture_quiet_period,
        );

        Self {
            id,
            options,
            width: 0,
            height: 0,
            sized: false,
            input: LineInput::new(),
            search_input: LineInput::new(),
            last_search: String::new(),
            search_backwards: true,
            search_found: true,
            lookback: 0,
            lookback_partial: String::new(),
            shutting_down: false,
            history,
            completion,
            execution,
            mode: None,
        }
    }

    /// Id messages for this session are addressed to
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Options the session was created with
    #[must_use]
    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    /// Active mode, `None` before [`init`](Self::init)
    #[must_use]
    pub fn mode(&self) -> Option<ModeKind> {
        self.mode.as_ref().map(Mode::kind)
    }

    /// Current input text
    #[must_use]
    pub fn input(&self) -> &str {
        self.input.value()
    }

    /// Cursor position within the input, in characters
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.input.cursor()
    }

    /// Command history
    #[must_use]
    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Completion suggestions
    #[must_use]
    pub const fn completion(&self) -> &CompletionModel {
        &self.completion
    }

    /// Returns true while a command can be cancelled
    #[must_use]
    pub const fn is_executing(&self) -> bool {
        self.execution.is_active()
    }

    /// Returns true once the first resize has arrived
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.sized
    }

    /// Returns true once the session has asked to quit
    #[must_use]
    pub const fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }
}
