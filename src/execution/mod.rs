//! Background command execution
//!
//! The [`ExecutionController`] hands out one [`ExecutionRequest`] per
//! submitted line and keeps the cancellation token of the command currently
//! running. The request runs on its own task: it dispatches the line to the
//! router, streams output back as it arrives, and always reports a finished
//! history item, whether the command succeeded, failed, was cancelled or
//! panicked.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::capture::capture_channel;
use crate::history::{HistoryItem, ItemStatus};
use crate::router::{CommandRouter, tokenize_line};
use crate::session::Message;
use crate::types::SessionId;

/// Tracks the command currently executing for one session
#[derive(Debug, Clone)]
pub struct ExecutionController {
    session: SessionId,
    base_token: CancellationToken,
    quiet_period: Duration,
    active: Option<CancellationToken>,
}

impl ExecutionController {
    /// Create a controller deriving command tokens from `base_token`
    #[must_use]
    pub fn new(session: SessionId, base_token: CancellationToken, quiet_period: Duration) -> Self {
        Self {
            session,
            base_token,
            quiet_period,
            active: None,
        }
    }

    /// Prepare the execution of `item` and make it the active command
    #[must_use]
    pub fn start(&mut self, item: HistoryItem) -> ExecutionRequest {
        let cancel = self.base_token.child_token();
        self.active = Some(cancel.clone());

        ExecutionRequest {
            session: self.session,
            item,
            cancel,
            quiet_period: self.quiet_period,
        }
    }

    /// Cancel the active command
    ///
    /// # Returns
    /// `false` if no command was active
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(token) => {
                log::debug!("Cancelling active command for session {}", self.session);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Forget the active command once it has reported back
    pub fn finish(&mut self) {
        self.active = None;
    }

    /// Returns true while a command can be cancelled
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

/// One command line ready to run on a background task
#[derive(Debug)]
pub struct ExecutionRequest {
    session: SessionId,
    item: HistoryItem,
    cancel: CancellationToken,
    quiet_period: Duration,
}

impl ExecutionRequest {
    /// History item being executed
    #[must_use]
    pub const fn item(&self) -> &HistoryItem {
        &self.item
    }

    /// Token the router should watch
    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run the command to completion
    ///
    /// Sends [`Message::CommandOutput`] as output is delivered and finally
    /// [`Message::CommandFinished`] with the updated item.
    pub async fn run(self, router: Arc<dyn CommandRouter>, messages: mpsc::UnboundedSender<Message>) {
        let Self {
            session,
            mut item,
            cancel,
            quiet_period,
        } = self;

        let args = tokenize_line(&item.line);
        let (writer, mut reader) = capture_channel(quiet_period);

        let item_id = item.id;
        let stream_tx = messages.clone();
        let forwarder = tokio::spawn(async move {
            let mut output = Vec::new();
            let mut unsent = Vec::new();
            while let Some(chunk) = reader.recv().await {
                output.extend_from_slice(&chunk);
                unsent.extend_from_slice(&chunk);
                let text = take_complete_utf8(&mut unsent);
                if !text.is_empty() {
                    let _ = stream_tx.send(Message::CommandOutput {
                        id: session,
                        item_id,
                        chunk: text,
                    });
                }
            }
            if !unsent.is_empty() {
                let _ = stream_tx.send(Message::CommandOutput {
                    id: session,
                    item_id,
                    chunk: String::from_utf8_lossy(&unsent).into_owned(),
                });
            }
            output
        });

        log::debug!("Executing {:?}", item.line);
        let dispatched = AssertUnwindSafe(router.dispatch(args, cancel, writer.clone()))
            .catch_unwind()
            .await;
        writer.close();

        let result = dispatched.unwrap_or_else(|panic| {
            let reason = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow::anyhow!("command panicked: {reason}"))
        });

        let output = forwarder.await.unwrap_or_else(|e| {
            log::error!("Output forwarder for {:?} failed: {e}", item.line);
            Vec::new()
        });

        item.finished = Some(Utc::now());
        match result {
            Ok(()) => item.status = ItemStatus::Success,
            Err(e) => {
                log::debug!("Command {:?} failed: {e:#}", item.line);
                item.status = ItemStatus::Error;
                item.error = Some(Arc::new(e));
            }
        }
        item.output = String::from_utf8_lossy(&output).trim().to_string();
        item.streaming_output.clear();

        if messages
            .send(Message::CommandFinished { id: session, item })
            .is_err()
        {
            log::error!("Session {session} is gone, dropping command result");
        }
    }
}

/// Decode the buffered bytes, leaving a trailing partial character behind
///
/// Invalid sequences elsewhere decode as U+FFFD.
fn take_complete_utf8(buffer: &mut Vec<u8>) -> String {
    let len = buffer.len();
    let mut split = len;
    for start in (len.saturating_sub(3)..len).rev() {
        let byte = buffer[start];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0xF0.. => 4,
            0xE0.. => 3,
            0xC0.. => 2,
            _ => 1,
        };
        if len - start < width {
            split = start;
        }
        break;
    }

    let tail = buffer.split_off(split);
    let text = String::from_utf8_lossy(buffer).into_owned();
    *buffer = tail;
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionIdGenerator;

    #[test]
    fn cancel_is_idempotent() {
        let base = CancellationToken::new();
        let mut controller = ExecutionController::new(
            SessionIdGenerator::new().next_id(),
            base.clone(),
            Duration::from_millis(50),
        );
        assert!(!controller.cancel());

        let request = controller.start(HistoryItem::new("> ", "sleep", ItemStatus::Running));
        assert!(controller.is_active());
        assert!(controller.cancel());
        assert!(request.cancel_token().is_cancelled());
        assert!(!controller.cancel());
        assert!(!base.is_cancelled());
    }

    #[test]
    fn base_token_cancels_every_command() {
        let base = CancellationToken::new();
        let mut controller = ExecutionController::new(
            SessionIdGenerator::new().next_id(),
            base.clone(),
            Duration::from_millis(50),
        );
        let request = controller.start(HistoryItem::new("> ", "sleep", ItemStatus::Running));
        base.cancel();
        assert!(request.cancel_token().is_cancelled());
    }

    #[test]
    fn split_characters_wait_for_their_tail() {
        let bytes = "añ€😀".as_bytes();
        let mut buffer = Vec::new();
        let mut text = String::new();
        for byte in bytes {
            buffer.push(*byte);
            let decoded = take_complete_utf8(&mut buffer);
            assert!(!decoded.contains('\u{FFFD}'));
            text.push_str(&decoded);
        }
        assert!(buffer.is_empty());
        assert_eq!(text, "añ€😀");
    }

    #[test]
    fn invalid_bytes_are_not_held_back() {
        let mut buffer = vec![b'a', 0xFF, b'b'];
        assert_eq!(take_complete_utf8(&mut buffer), "a\u{FFFD}b");
        assert!(buffer.is_empty());

        let mut buffer = vec![b'x', 0xE2, 0x82];
        assert_eq!(take_complete_utf8(&mut buffer), "x");
        assert_eq!(buffer, [0xE2, 0x82]);
    }

    #[tokio::test]
    async fn streamed_chunks_keep_split_characters_whole() {
        struct Split;

        impl CommandRouter for Split {
            fn dispatch<'a>(
                &'a self,
                _args: Vec<String>,
                _cancel: CancellationToken,
                out: crate::capture::CaptureWriter,
            ) -> futures::future::BoxFuture<'a, anyhow::Result<()>> {
                Box::pin(async move {
                    let bytes = "€uro".as_bytes();
                    out.write_bytes(&bytes[..1])?;
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    out.write_bytes(&bytes[1..])?;
                    Ok(())
                })
            }
        }

        let mut controller = ExecutionController::new(
            SessionIdGenerator::new().next_id(),
            CancellationToken::new(),
            Duration::from_millis(5),
        );
        let request = controller.start(HistoryItem::new("> ", "split", ItemStatus::Running));
        let (tx, mut rx) = mpsc::unbounded_channel();
        request.run(Arc::new(Split), tx).await;

        let mut streamed = String::new();
        while let Ok(message) = rx.try_recv() {
            if let Message::CommandOutput { chunk, .. } = message {
                streamed.push_str(&chunk);
            }
        }
        assert_eq!(streamed, "€uro");
    }
}
