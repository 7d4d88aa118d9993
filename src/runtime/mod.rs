//! Tokio driver for a [`ShellSession`]
//!
//! [`spawn_shell`] moves a session onto a single interaction task which
//! applies messages one at a time and never blocks. Effects are carried out
//! on background tasks whose results come back as tagged messages:
//!
//! ```text
//!   host ──keys/resize──▶ ┌──────────────────┐ ──Redraw/Print/Quit──▶ host
//!                         │ interaction task │
//!        ┌──messages──────│  (owns session)  │──────────────┐
//!        │                └──────────────────┘              │
//!        │        ▲          ▲            ▲                 ▼
//!   command task  │    completion task  history load   history saver
//!   (one per line)│                                    (one writer, coalesces
//!                 └──────────── failures ────────────── to newest snapshot)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kodegen_shell::{HostOutput, ShellOptions, spawn_shell};
//! # use kodegen_shell::CommandRouter;
//! # async fn example(router: Arc<dyn CommandRouter>) -> kodegen_shell::Result<()> {
//! let mut shell = spawn_shell(router, ShellOptions::default());
//! shell.resize(80, 24)?;
//!
//! while let Some(output) = shell.next_output().await {
//!     match output {
//!         HostOutput::Redraw(view) => { /* paint view.lines(false) */ }
//!         HostOutput::Print(text) => println!("{text}"),
//!         HostOutput::Quit => break,
//!     }
//! }
//! shell.wait().await
//! # }
//! ```

mod tasks;

use std::sync::Arc;

use crossterm::event::KeyEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, ShellError};
use crate::router::CommandRouter;
use crate::session::{Message, ShellSession, ViewModel};
use crate::types::{SessionId, ShellOptions};

/// Notifications for the host
#[derive(Debug)]
pub enum HostOutput {
    /// The view changed
    Redraw(Box<ViewModel>),
    /// Print text above the managed view (inline mode)
    Print(String),
    /// The session is over; pending history saves have completed
    Quit,
}

/// Handle to a running shell session
#[derive(Debug)]
pub struct ShellHandle {
    session_id: SessionId,
    messages: mpsc::UnboundedSender<Message>,
    output: mpsc::UnboundedReceiver<HostOutput>,
    task: JoinHandle<()>,
}

/// Start a shell session on its own task
///
/// Must be called from within a tokio runtime.
pub fn spawn_shell(router: Arc<dyn CommandRouter>, options: ShellOptions) -> ShellHandle {
    let options = Arc::new(options);
    let session = ShellSession::new(Arc::clone(&options));
    let session_id = session.id();

    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let (output_tx, output_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(tasks::interaction_loop(
        session,
        router,
        options,
        message_tx.clone(),
        message_rx,
        output_tx,
    ));

    ShellHandle {
        session_id,
        messages: message_tx,
        output: output_rx,
        task,
    }
}

impl ShellHandle {
    /// Id of the session
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Deliver a message to the session
    ///
    /// # Errors
    /// Returns an error if the session has ended
    pub fn send(&self, message: Message) -> Result<()> {
        self.messages
            .send(message)
            .map_err(|_| ShellError::channel_closed("shell session has ended"))
    }

    /// Deliver a key event
    ///
    /// # Errors
    /// Returns an error if the session has ended
    pub fn send_key(&self, key: KeyEvent) -> Result<()> {
        self.send(Message::key(key))
    }

    /// Deliver a resize event
    ///
    /// # Errors
    /// Returns an error if the session has ended
    pub fn resize(&self, width: u16, height: u16) -> Result<()> {
        self.send(Message::resize(width, height))
    }

    /// Ask the session to shut down
    ///
    /// # Errors
    /// Returns an error if the session has ended
    pub fn shutdown(&self) -> Result<()> {
        self.send(Message::Shutdown {
            id: self.session_id,
        })
    }

    /// Wait for the next notification
    ///
    /// Returns `None` once the session has ended and every notification has
    /// been received.
    pub async fn next_output(&mut self) -> Option<HostOutput> {
        self.output.recv().await
    }

    /// Stop listening and wait for the interaction task to finish
    ///
    /// A session which has not quit yet is shut down, and its pending
    /// history saves complete before this returns.
    ///
    /// # Errors
    /// Returns an error if the interaction task panicked
    pub async fn wait(self) -> Result<()> {
        let Self {
            messages,
            output,
            task,
            ..
        } = self;
        drop(output);
        drop(messages);
        task.await
            .map_err(|e| ShellError::channel_closed(format!("interaction task failed: {e}")))
    }
}
