//! Newtype wrappers for type safety
//!
//! This module contains the identifiers used to route messages between the
//! interaction task and its background tasks, and to address history items.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Session identifiers
// ============================================================================

/// Identifier of one live model instance (session, history store, completion client)
///
/// Asynchronous results carry the id of the instance that issued the request,
/// and are only applied when it matches the receiving instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Get the raw numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns true if a message addressed to `target` is for this instance
    #[must_use]
    pub fn matches(self, target: SessionId) -> bool {
        self == target
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mints [`SessionId`]s
///
/// Ids are unique per generator and never reused. Share one generator (for
/// example via [`ShellOptions`](crate::ShellOptions)) between every shell in a
/// process to make them process-unique.
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    last: AtomicU64,
}

impl SessionIdGenerator {
    /// Create a generator whose first id is 1
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Mint the next id
    pub fn next_id(&self) -> SessionId {
        SessionId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

// ============================================================================
// History item identifiers
// ============================================================================

/// Unique, time-sortable identifier of a history item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Create a new id ordered after every id created before it
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_monotonic() {
        let ids = SessionIdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
        assert!(!a.matches(b));
        assert!(a.matches(a));
    }

    #[test]
    fn item_ids_are_v7() {
        let first = ItemId::new();
        let second = ItemId::new();
        assert_ne!(first, second);
        assert_eq!(first.as_uuid().get_version_num(), 7);
    }
}
