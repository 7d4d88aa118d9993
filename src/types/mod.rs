//! Type definitions for the shell session engine
//!
//! This module contains the type definitions shared throughout the crate,
//! organized into logical submodules:
//!
//! - [`identifiers`] - Type-safe ids (`SessionId`, `ItemId`) and the id generator
//! - [`keymap`] - Key bindings for every logical shell action
//! - [`options`] - Main configuration options and builder

pub mod identifiers;
pub mod keymap;
pub mod options;

// Re-export commonly used types
pub use identifiers::{ItemId, SessionId, SessionIdGenerator};
pub use keymap::{KeyBinding, KeyMap};
pub use options::{PromptFn, ShellOptions, ShellOptionsBuilder};
