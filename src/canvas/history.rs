//! Bounded snapshot history with a cursor.

use std::collections::VecDeque;

use crate::config::HISTORY_CAPACITY;

/// Linear undo/redo stack of serialized scene snapshots.
///
/// `cursor` is `None` only while the history is empty. Pushing while the
/// cursor is behind the tail discards the redo branch first.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    cursor: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: String) {
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }
        self.entries.push_back(snapshot);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back one entry and return it, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&str> {
        match self.cursor {
            Some(cursor) if cursor > 0 => {
                self.cursor = Some(cursor - 1);
                self.entries.get(cursor - 1).map(String::as_str)
            }
            _ => None,
        }
    }

    /// Step forward one entry and return it, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&str> {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.entries.len() => {
                self.cursor = Some(cursor + 1);
                self.entries.get(cursor + 1).map(String::as_str)
            }
            _ => None,
        }
    }

    /// The entry `undo` would return, without moving the cursor.
    pub fn peek_undo(&self) -> Option<&str> {
        match self.cursor {
            Some(cursor) if cursor > 0 => self.entries.get(cursor - 1).map(String::as_str),
            _ => None,
        }
    }

    /// The entry `redo` would return, without moving the cursor.
    pub fn peek_redo(&self) -> Option<&str> {
        match self.cursor {
            Some(cursor) => self.entries.get(cursor + 1).map(String::as_str),
            None => None,
        }
    }

    /// Drop everything and start over from `snapshot`.
    pub fn reset(&mut self, snapshot: String) {
        self.entries.clear();
        self.cursor = None;
        self.push(snapshot);
    }

    pub fn current(&self) -> Option<&str> {
        self.cursor
            .and_then(|c| self.entries.get(c))
            .map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
