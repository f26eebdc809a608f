//! Bounded conversational history.
//!
//! Keeps the N most recent turns, oldest first, and hands out copies for
//! use as request context. Owned by the dispatch pipeline and populated
//! directly by it; nothing here depends on how turns are rendered.

use std::collections::VecDeque;

use parley_core::Turn;

// =============================================================================
// HistoryWindow
// =============================================================================

/// FIFO window over the most recent turns.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    turns: VecDeque<Turn>,
    capacity: usize,
    /// Bumped on every `clear`, so work started before a reset can tell.
    epoch: u64,
}

impl HistoryWindow {
    /// Create an empty window holding at most `capacity` turns.
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
            epoch: 0,
        }
    }

    /// Add `turn` at the tail, evicting from the head while over capacity.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    /// Current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Empty the window and start a new epoch.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.epoch += 1;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// =============================================================================
// Tests
// =============================================================================
