//! Background tasks driving a session

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::completion::query_completions;
use crate::history::{HistoryItem, load_history, persist_history};
use crate::router::CommandRouter;
use crate::session::{Effect, Message, ShellSession};
use crate::types::{SessionId, ShellOptions};

use super::HostOutput;

/// Owns the session and applies messages one at a time
pub(super) async fn interaction_loop(
    mut session: ShellSession,
    router: Arc<dyn CommandRouter>,
    options: Arc<ShellOptions>,
    message_tx: mpsc::UnboundedSender<Message>,
    mut message_rx: mpsc::UnboundedReceiver<Message>,
    output_tx: mpsc::UnboundedSender<HostOutput>,
) {
    let saver = HistorySaver::spawn(options.history_file.clone(), message_tx.clone());
    let interpreter = EffectInterpreter {
        router,
        options,
        messages: message_tx,
        output: output_tx.clone(),
        saver: saver.sender(),
    };

    let effects = session.init();
    let mut quit = interpreter.apply(effects);
    let _ = output_tx.send(HostOutput::Redraw(Box::new(session.view())));

    while !quit {
        tokio::select! {
            message = message_rx.recv() => {
                let Some(message) = message else {
                    break;
                };
                let effects = session.update(message);
                quit = interpreter.apply(effects);

                if output_tx
                    .send(HostOutput::Redraw(Box::new(session.view())))
                    .is_err()
                {
                    log::debug!("Host stopped listening to session {}", session.id());
                    break;
                }
            }
            () = output_tx.closed() => {
                log::debug!("Host dropped session {}", session.id());
                break;
            }
        }
    }

    if !session.is_shutting_down() {
        let effects = session.update(Message::Shutdown { id: session.id() });
        let _ = interpreter.apply(effects);
    }

    drop(interpreter);
    saver.finish().await;
    let _ = output_tx.send(HostOutput::Quit);
    log::debug!("Session {} finished", session.id());
}

/// Carries out effects by spawning background work
struct EffectInterpreter {
    router: Arc<dyn CommandRouter>,
    options: Arc<ShellOptions>,
    messages: mpsc::UnboundedSender<Message>,
    output: mpsc::UnboundedSender<HostOutput>,
    saver: mpsc::UnboundedSender<SaveRequest>,
}

impl EffectInterpreter {
    /// Apply effects in order
    ///
    /// # Returns
    /// `true` if the session asked to quit
    fn apply(&self, effects: Vec<Effect>) -> bool {
        let mut quit = false;

        for effect in effects {
            match effect {
                Effect::LoadHistory { id } => self.load_history(id),
                Effect::SaveHistory { id, snapshot } => {
                    if self.saver.send(SaveRequest { id, snapshot }).is_err() {
                        log::error!("History saver has stopped, dropping snapshot");
                    }
                }
                Effect::Execute(request) => {
                    tokio::spawn(request.run(Arc::clone(&self.router), self.messages.clone()));
                }
                Effect::Complete(request) => {
                    let router = Arc::clone(&self.router);
                    let messages = self.messages.clone();
                    let timeout = self.options.completion_timeout;
                    let base_token = self.options.base_token.clone();

                    tokio::spawn(async move {
                        let result =
                            query_completions(router.as_ref(), &request.line, timeout, &base_token)
                                .await;
                        let _ = messages.send(Message::CompletionReady {
                            id: request.target,
                            seq: request.seq,
                            result,
                        });
                    });
                }
                Effect::Emit(message) => {
                    if self.messages.send(message).is_err() {
                        log::error!("Session inbox closed, dropping emitted message");
                    }
                }
                Effect::Print(text) => {
                    let _ = self.output.send(HostOutput::Print(text));
                }
                Effect::Quit => quit = true,
            }
        }

        quit
    }

    fn load_history(&self, id: SessionId) {
        let file_name = self.options.history_file.clone();
        let strict = !self.options.inline;
        let messages = self.messages.clone();

        tokio::spawn(async move {
            let items = load_history(file_name.as_deref(), strict).await;
            let _ = messages.send(Message::HistoryLoaded { id, items });
        });
    }
}

/// A snapshot waiting to be written
struct SaveRequest {
    id: SessionId,
    snapshot: Vec<HistoryItem>,
}

/// Single writer for the history file
///
/// Saves run one at a time in submission order; snapshots queued behind a
/// running save are coalesced to the newest.
struct HistorySaver {
    tx: mpsc::UnboundedSender<SaveRequest>,
    task: JoinHandle<()>,
}

impl HistorySaver {
    fn spawn(file_name: Option<String>, messages: mpsc::UnboundedSender<Message>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SaveRequest>();

        let task = tokio::spawn(async move {
            while let Some(mut request) = rx.recv().await {
                while let Ok(newer) = rx.try_recv() {
                    request = newer;
                }

                if let Some(error_item) = persist_history(file_name.as_deref(), &request.snapshot).await {
                    let _ = messages.send(Message::HistoryItemAdded {
                        id: request.id,
                        item: error_item,
                    });
                }
            }
        });

        Self { tx, task }
    }

    fn sender(&self) -> mpsc::UnboundedSender<SaveRequest> {
        self.tx.clone()
    }

    /// Wait for every queued save to complete
    async fn finish(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            log::error!("History saver failed: {e}");
        }
    }
}
