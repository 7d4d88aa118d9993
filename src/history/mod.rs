//! Command history
//!
//! A bounded, append-only log of commands ([`HistoryStore`]) with JSON-lines
//! persistence ([`persist`]), lookback and case-insensitive substring search.
//!
//! Items are created when a command is submitted (status
//! [`ItemStatus::Running`]) and replaced by id when it finishes. Internal error
//! items and the restored-history marker are shown in the session but never
//! written to disk.

pub mod error_block;
mod item;
pub mod persist;
pub mod render;
mod store;

pub use error_block::render_error;
pub use item::{HistoryItem, ItemKind, ItemStatus};
pub use persist::{
    MAX_LINE_BYTES, history_file_location, load_history, persist_history, read_history,
    save_history,
};
pub use render::{RenderSettings, render_item};
pub use store::{HistoryStore, LIMIT};
