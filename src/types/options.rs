//! Shell options and configuration
//!
//! This module contains the configuration consumed by the shell session
//! engine, including a builder pattern for easy configuration.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::identifiers::SessionIdGenerator;
use super::keymap::KeyMap;

// ============================================================================
// Defaults
// ============================================================================

/// Default history file name, relative to the home directory
pub const DEFAULT_HISTORY_FILE: &str = ".kodegen-shell-history";

/// Default quiet period before captured output is delivered (50ms)
pub const DEFAULT_CAPTURE_QUIET_PERIOD: Duration = Duration::from_millis(50);

/// Default deadline for a completion query (500ms)
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_millis(500);

/// Default maximum number of stack frames shown for an error
pub const DEFAULT_MAX_STACK_FRAMES: usize = 8;

/// Frames from these module paths are hidden from rendered errors by default
pub const DEFAULT_STACK_FRAME_FILTERS: &[&str] = &[
    "std",
    "core",
    "alloc",
    "tokio",
    "futures",
    "futures_util",
    "anyhow",
    "kodegen_shell",
];

/// Callback producing the prompt shown in front of the input
pub type PromptFn = Arc<dyn Fn() -> String + Send + Sync>;

// ============================================================================
// Shell Options
// ============================================================================

/// Main options for the shell session engine
#[derive(Clone)]
pub struct ShellOptions {
    /// History file name; relative names resolve under the home directory,
    /// `None` disables persistence
    pub history_file: Option<String>,
    /// Key bindings
    pub keymap: KeyMap,
    /// Token every command's cancellation token is derived from
    pub base_token: CancellationToken,
    /// Maximum number of stack frames rendered for a command error
    pub max_stack_frames: usize,
    /// Module path prefixes hidden from rendered stack frames
    pub stack_frame_filters: Vec<String>,
    /// Render inline (terminal scrollback) rather than full screen
    pub inline: bool,
    /// Prompt generator, called each time the prompt is shown
    pub prompt: PromptFn,
    /// Placeholder shown while the input is empty
    pub placeholder: String,
    /// Quiet period before streamed output is delivered
    pub capture_quiet_period: Duration,
    /// Deadline for completion queries
    pub completion_timeout: Duration,
    /// Generator for instance identifiers
    pub ids: Arc<SessionIdGenerator>,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            history_file: Some(DEFAULT_HISTORY_FILE.to_string()),
            keymap: KeyMap::default(),
            base_token: CancellationToken::new(),
            max_stack_frames: DEFAULT_MAX_STACK_FRAMES,
            stack_frame_filters: DEFAULT_STACK_FRAME_FILTERS
                .iter()
                .map(ToString::to_string)
                .collect(),
            inline: false,
            prompt: Arc::new(|| "> ".to_string()),
            placeholder: "Enter your command here...".to_string(),
            capture_quiet_period: DEFAULT_CAPTURE_QUIET_PERIOD,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            ids: Arc::new(SessionIdGenerator::new()),
        }
    }
}

impl ShellOptions {
    /// Create a new builder for `ShellOptions`
    #[must_use]
    pub fn builder() -> ShellOptionsBuilder {
        ShellOptionsBuilder::default()
    }

    /// Render the prompt
    #[must_use]
    pub fn render_prompt(&self) -> String {
        (self.prompt)()
    }
}

impl std::fmt::Debug for ShellOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellOptions")
            .field("history_file", &self.history_file)
            .field("keymap", &self.keymap)
            .field("base_token", &self.base_token)
            .field("max_stack_frames", &self.max_stack_frames)
            .field("stack_frame_filters", &self.stack_frame_filters)
            .field("inline", &self.inline)
            .field("prompt", &"<callback>")
            .field("placeholder", &self.placeholder)
            .field("capture_quiet_period", &self.capture_quiet_period)
            .field("completion_timeout", &self.completion_timeout)
            .field("ids", &self.ids)
            .finish()
    }
}

// ============================================================================
// Builder for ShellOptions
// ============================================================================

/// Builder for `ShellOptions`
#[derive(Debug, Default)]
pub struct ShellOptionsBuilder {
    options: ShellOptions,
}

impl ShellOptionsBuilder {
    /// Set the history file (relative names resolve under `$HOME`)
    #[must_use]
    pub fn history_file(mut self, file_name: impl Into<String>) -> Self {
        self.options.history_file = Some(file_name.into());
        self
    }

    /// Disable history persistence
    #[must_use]
    pub fn no_history(mut self) -> Self {
        self.options.history_file = None;
        self
    }

    /// Set the key bindings
    #[must_use]
    pub fn keymap(mut self, keymap: KeyMap) -> Self {
        self.options.keymap = keymap;
        self
    }

    /// Set the token commands are cancelled through
    ///
    /// Cancelling it cancels every command, present and future.
    #[must_use]
    pub fn base_token(mut self, token: CancellationToken) -> Self {
        self.options.base_token = token;
        self
    }

    /// Set the maximum number of stack frames shown in errors
    #[must_use]
    pub const fn max_stack_frames(mut self, frames: usize) -> Self {
        self.options.max_stack_frames = frames;
        self
    }

    /// Add module prefixes to hide from stack frames, keeping the defaults
    #[must_use]
    pub fn additional_stack_frame_filters(
        mut self,
        prefixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut filters: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        filters.append(&mut self.options.stack_frame_filters);
        self.options.stack_frame_filters = filters;
        self
    }

    /// Replace the stack frame filters; an empty list disables filtering
    #[must_use]
    pub fn stack_frame_filters(
        mut self,
        prefixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.options.stack_frame_filters = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Render inline instead of full screen
    ///
    /// Finished commands are printed into the terminal's own scrollback and
    /// restored history is not shown.
    #[must_use]
    pub const fn inline(mut self) -> Self {
        self.options.inline = true;
        self
    }

    /// Set the prompt generator
    #[must_use]
    pub fn prompt_fn<F>(mut self, prompt: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.options.prompt = Arc::new(prompt);
        self
    }

    /// Set the input placeholder
    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.options.placeholder = placeholder.into();
        self
    }

    /// Set the quiet period for streamed command output
    #[must_use]
    pub const fn capture_quiet_period(mut self, period: std::time::Duration) -> Self {
        self.options.capture_quiet_period = period;
        self
    }

    /// Set the completion query deadline
    #[must_use]
    pub const fn completion_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.options.completion_timeout = timeout;
        self
    }

    /// Share an id generator with other shells in the process
    #[must_use]
    pub fn id_generator(mut self, ids: Arc<SessionIdGenerator>) -> Self {
        self.options.ids = ids;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ShellOptions {
        self.options
    }
}
