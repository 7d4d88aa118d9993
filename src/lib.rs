//! # Embeddable interactive shell engine
//!
//! A line-oriented shell session for terminal applications: a prompt with an
//! editable input line, a persistent command history with lookback and
//! incremental search, tab completion supplied by the application, and
//! cancellable background execution with streamed output.
//!
//! The application provides the commands by implementing [`CommandRouter`].
//! The shell provides everything around them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::io::Write;
//! use std::sync::Arc;
//!
//! use futures::future::BoxFuture;
//! use kodegen_shell::{CaptureWriter, CommandRouter, HostOutput, ShellOptions, spawn_shell};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Echo;
//!
//! impl CommandRouter for Echo {
//!     fn dispatch<'a>(
//!         &'a self,
//!         args: Vec<String>,
//!         _cancel: CancellationToken,
//!         mut out: CaptureWriter,
//!     ) -> BoxFuture<'a, anyhow::Result<()>> {
//!         Box::pin(async move {
//!             writeln!(out, "{}", args.join(" "))?;
//!             Ok(())
//!         })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> kodegen_shell::Result<()> {
//!     let options = ShellOptions::builder().history_file(".echo-history").build();
//!     let mut shell = spawn_shell(Arc::new(Echo), options);
//!     shell.resize(80, 24)?;
//!
//!     while let Some(output) = shell.next_output().await {
//!         match output {
//!             HostOutput::Redraw(view) => {
//!                 for line in view.lines(false) {
//!                     println!("{line}");
//!                 }
//!             }
//!             HostOutput::Print(text) => println!("{text}"),
//!             HostOutput::Quit => break,
//!         }
//!     }
//!     shell.wait().await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`session`]: The [`ShellSession`] state machine; `update` applies one
//!   message and returns [`Effect`]s, `view` projects a [`ViewModel`]
//! - [`runtime`]: Drives a session on a tokio task and carries out effects
//! - [`history`]: History items, the bounded store, persistence and rendering
//! - [`completion`]: Completion queries, parsing and the suggestion list
//! - [`execution`]: Background command execution and cancellation
//! - [`capture`]: Debounced output capture for running commands
//! - [`router`]: The [`CommandRouter`] contract and line tokenizing
//! - [`types`]: Options, key bindings and identifiers
//! - [`error`]: Error types and handling
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`] facade. Hosts which own the terminal
//! should send them somewhere other than stderr; the bundled
//! `kodegen-shell` binary writes them to the file named by
//! `KODEGEN_SHELL_LOG`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capture;
pub mod completion;
pub mod error;
pub mod execution;
pub mod history;
pub(crate) mod modes;
pub mod router;
pub mod runtime;
pub mod session;
pub mod types;

// Re-export commonly used types for external API
pub use capture::{CaptureReader, CaptureWriter, capture_channel};
pub use completion::{
    CompletionModel, CompletionOption, CompletionRequest, CompletionResult, Directive,
    Suggestion, SuggestionList,
};
pub use error::{Result, ShellError};
pub use execution::{ExecutionController, ExecutionRequest};
pub use history::{HistoryItem, HistoryStore, ItemKind, ItemStatus};
pub use router::{COMPLETE_REQUEST_CMD, CommandRouter, tokenize_line};
pub use runtime::{HostOutput, ShellHandle, spawn_shell};
pub use session::{
    Effect, HelpEntry, HistoryBlock, InputEvent, LineInput, Message, ModeKind, Overlay,
    ShellSession, ViewModel,
};
pub use types::{
    ItemId, KeyBinding, KeyMap, PromptFn, SessionId, SessionIdGenerator, ShellOptions,
    ShellOptionsBuilder,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
