//! Completion queries against the command router

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::capture::capture_channel;
use crate::router::{COMPLETE_REQUEST_CMD, CommandRouter, tokenize_line};
use crate::types::SessionId;

use super::parser::{CompletionResult, parse_completions};

/// A completion query waiting to be run on a background task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Completion model the answer is addressed to
    pub target: SessionId,
    /// Sequence number of the query within that model
    pub seq: u64,
    /// Text to complete (the input up to the cursor)
    pub line: String,
}

/// Ask the router for completions of `line`
///
/// The query is cancelled once `timeout` elapses. Failures and timeouts are
/// logged and yield an empty result.
pub async fn query_completions(
    router: &dyn CommandRouter,
    line: &str,
    timeout: Duration,
    base_token: &CancellationToken,
) -> CompletionResult {
    let mut args = vec![COMPLETE_REQUEST_CMD.to_string()];
    args.extend(tokenize_line(line));

    let cancel = base_token.child_token();
    let (writer, reader) = capture_channel(Duration::ZERO);

    let outcome = tokio::time::timeout(timeout, router.dispatch(args, cancel.clone(), writer.clone())).await;
    writer.close();

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            log::warn!("Completion query for {line:?} failed: {e:#}");
            return CompletionResult::default();
        }
        Err(_) => {
            cancel.cancel();
            log::warn!("Completion query for {line:?} timed out after {timeout:?}");
            return CompletionResult::default();
        }
    }

    let output = reader.read_to_end().await;
    let result = parse_completions(&String::from_utf8_lossy(&output));
    log::debug!(
        "Completion query for {line:?} returned {} options",
        result.options.len()
    );
    result
}
