//! In-memory command history

use std::collections::VecDeque;

use crate::types::{ItemId, SessionId};

use super::item::{HistoryItem, ItemKind};

/// Maximum number of items kept in memory and on disk
pub const LIMIT: usize = 1000;

/// Bounded, append-only command history
///
/// Mutations return the snapshot to persist, so the caller can issue the save
/// only after the in-memory list has been updated.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    id: SessionId,
    items: VecDeque<HistoryItem>,
}

impl HistoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            items: VecDeque::new(),
        }
    }

    /// Id messages for this store are addressed to
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items, oldest first
    pub fn items(&self) -> impl DoubleEndedIterator<Item = &HistoryItem> + ExactSizeIterator {
        self.items.iter()
    }

    /// Find an item by id, searching newest first
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&HistoryItem> {
        self.items.iter().rev().find(|item| item.id == id)
    }

    /// Find an item by id for in-place changes that are not persisted
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut HistoryItem> {
        self.items.iter_mut().rev().find(|item| item.id == id)
    }

    /// Merge items loaded from disk in front of the current session's items
    pub fn restore(&mut self, loaded: Vec<HistoryItem>) {
        let current = std::mem::take(&mut self.items);
        self.items = loaded.into();
        self.items.extend(current);
        self.trim();
    }

    /// Append an item, evicting the oldest past [`LIMIT`]
    ///
    /// # Returns
    /// The snapshot to persist
    pub fn append(&mut self, item: HistoryItem) -> Vec<HistoryItem> {
        self.items.push_back(item);
        self.trim();
        self.snapshot()
    }

    /// Replace the item with the same id, or append it if there is none
    ///
    /// # Returns
    /// The snapshot to persist
    pub fn update(&mut self, item: HistoryItem) -> Vec<HistoryItem> {
        match self.items.iter().rposition(|existing| existing.id == item.id) {
            Some(index) => {
                self.items[index] = item;
                self.snapshot()
            }
            None => self.append(item),
        }
    }

    /// The persistable items, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<HistoryItem> {
        self.items
            .iter()
            .filter(|item| item.is_command())
            .cloned()
            .collect()
    }

    /// The item `lookback` places back from the newest
    ///
    /// Valid range is `1..=len`; anything else is `None`.
    #[must_use]
    pub fn lookback(&self, lookback: usize) -> Option<&HistoryItem> {
        if lookback == 0 || lookback > self.items.len() {
            return None;
        }
        self.items.get(self.items.len() - lookback)
    }

    /// The line of the item at `lookback`, or empty if out of range
    #[must_use]
    pub fn line_at(&self, lookback: usize) -> &str {
        self.lookback(lookback).map_or("", |item| item.line.as_str())
    }

    /// Find the next command whose line differs from the one at `offset`
    ///
    /// Moves towards older items when `backwards` is set, newer otherwise.
    /// Returns `None` when there is no such command in that direction.
    #[must_use]
    pub fn next_distinct(&self, offset: usize, backwards: bool) -> Option<usize> {
        let current = self.line_at(offset);
        let distinct = |lookback: &usize| {
            self.lookback(*lookback)
                .is_some_and(|item| item.is_command() && item.line != current)
        };

        if backwards {
            (offset + 1..=self.items.len()).find(distinct)
        } else {
            (1..offset.min(self.items.len() + 1)).rev().find(distinct)
        }
    }

    /// Case-insensitive substring search over command lines
    ///
    /// Starts at lookback `start` and moves by `delta` (`1` goes back in
    /// time, `-1` forward), skipping items whose line equals the one at
    /// `start`.
    ///
    /// # Returns
    /// `(index, true)` for a match, `(start, false)` when the history is
    /// exhausted, and `(0, false)` for an empty term or empty history
    #[must_use]
    pub fn search(&self, term: &str, start: usize, delta: isize) -> (usize, bool) {
        let term = term.trim().to_lowercase();
        if self.items.is_empty() || term.is_empty() {
            return (0, false);
        }
        if delta == 0 {
            return (start, false);
        }

        let current = self.line_at(start);
        let mut index = start;
        loop {
            index = match index.checked_add_signed(delta) {
                Some(next) if next > 0 && next <= self.items.len() => next,
                _ => return (start, false),
            };

            let matched = self.lookback(index).is_some_and(|item| {
                item.kind == ItemKind::Command
                    && item.line != current
                    && item.line.to_lowercase().contains(&term)
            });
            if matched {
                return (index, true);
            }
        }
    }

    fn trim(&mut self) {
        while self.items.len() > LIMIT {
            self.items.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::item::ItemStatus;
    use crate::types::SessionIdGenerator;

    fn store_with(lines: &[&str]) -> HistoryStore {
        let mut store = HistoryStore::new(SessionIdGenerator::new().next_id());
        for line in lines {
            let _ = store.append(HistoryItem::new("> ", *line, ItemStatus::Success));
        }
        store
    }

    #[test]
    fn lookback_is_one_based_from_newest() {
        let store = store_with(&["a", "b", "c"]);
        assert!(store.lookback(0).is_none());
        assert_eq!(store.line_at(1), "c");
        assert_eq!(store.line_at(3), "a");
        assert!(store.lookback(4).is_none());
        assert_eq!(store.line_at(4), "");
    }

    #[test]
    fn next_distinct_skips_duplicates_and_internal_items() {
        let mut store = store_with(&["a", "b", "b"]);
        let _ = store.append(HistoryItem::internal_error("oops", anyhow::anyhow!("x")));

        assert_eq!(store.next_distinct(0, true), Some(2));
        assert_eq!(store.next_distinct(2, true), Some(4));
        assert_eq!(store.next_distinct(4, true), None);
        assert_eq!(store.next_distinct(4, false), Some(3));
        assert_eq!(store.next_distinct(2, false), None);
    }

    #[test]
    fn search_skips_the_current_line() {
        let store = store_with(&["git status", "ls", "git status", "git log"]);
        assert_eq!(store.search("git", 0, 1), (1, true));
        assert_eq!(store.search("git", 1, 1), (2, true));
        assert_eq!(store.search("git", 2, 1), (2, false));
        assert_eq!(store.search("GIT LOG", 0, 1), (1, true));
        assert_eq!(store.search("", 0, 1), (0, false));
    }
}
