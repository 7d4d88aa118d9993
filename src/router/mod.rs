//! Command router contract
//!
//! The shell does not know how commands are defined. It hands each tokenized
//! line to a [`CommandRouter`] together with a cancellation token and an
//! output sink, and uses the same entry point for completion queries by
//! prefixing the arguments with [`COMPLETE_REQUEST_CMD`].
//!
//! # Completion protocol
//!
//! For `["__complete", tokens...]` the router writes one candidate per line,
//! `name<TAB>description` (description optional), followed by a line
//! `:<directive>` where the directive is a decimal bitmask.
//!
//! ```text
//! help	Show help for a command
//! history	Show the command history
//! :4
//! ```

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::capture::CaptureWriter;

/// First argument of a completion request
pub const COMPLETE_REQUEST_CMD: &str = "__complete";

/// Something which can execute a tokenized command line
///
/// # Example
///
/// ```no_run
/// use std::io::Write;
/// use futures::future::BoxFuture;
/// use kodegen_shell::{CaptureWriter, CommandRouter};
/// use tokio_util::sync::CancellationToken;
///
/// struct Echo;
///
/// impl CommandRouter for Echo {
///     fn dispatch<'a>(
///         &'a self,
///         args: Vec<String>,
///         _cancel: CancellationToken,
///         mut out: CaptureWriter,
///     ) -> BoxFuture<'a, anyhow::Result<()>> {
///         Box::pin(async move {
///             writeln!(out, "{}", args.join(" "))?;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait CommandRouter: Send + Sync {
    /// Execute one command
    ///
    /// # Arguments
    /// * `args` - Tokenized command line; `args[0]` is the command name, or
    ///   [`COMPLETE_REQUEST_CMD`] for completion queries
    /// * `cancel` - Cancelled when the user stops the command
    /// * `out` - Sink for stdout and stderr, in write order
    ///
    /// # Errors
    /// Any error is recorded on the history item of the command
    fn dispatch<'a>(
        &'a self,
        args: Vec<String>,
        cancel: CancellationToken,
        out: CaptureWriter,
    ) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Split a command line into arguments
///
/// Whitespace separates arguments unless inside double quotes, and a
/// backslash escapes the following character. An empty line, or one ending
/// in unquoted whitespace, yields a trailing empty argument so completion
/// queries ask for the next word.
#[must_use]
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                in_token = true;
                current.push(chars.next().unwrap_or('\\'));
            }
            '"' => {
                in_token = true;
                in_quotes = !in_quotes;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    // trailing word, or an empty one if the line ended between words
    tokens.push(current);
    tokens
}
