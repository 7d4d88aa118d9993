//! Tab completion
//!
//! Completion candidates come from the command router: the shell dispatches
//! `["__complete", tokens...]` and parses the textual answer (see
//! [`crate::router`] for the protocol). This module owns the query, the
//! parsing and escaping of candidates, and the layout and navigation of the
//! suggestion list.

mod client;
mod model;
mod parser;

pub use client::{CompletionRequest, query_completions};
pub use model::{COLUMN_PADDING, CompletionModel, MAX_ROWS, Suggestion, SuggestionList};
pub use parser::{
    CompletionOption, CompletionResult, Directive, escape_special_characters, parse_completions,
};
