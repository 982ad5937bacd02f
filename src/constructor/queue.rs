//! Exploration queues for the product construction.

use std::collections::VecDeque;

/// The frontier of the product exploration.
pub trait ExplorationQueue<I> {
    /// Adds a newly discovered item.
    fn push(&mut self, item: I);
    /// Removes the next item to expand.
    fn pop(&mut self) -> Option<I>;
}

/// Expands nodes in the order they were discovered.
pub struct BfsQueue<I> {
    queue: VecDeque<I>,
}

impl<I> BfsQueue<I> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
        }
    }
}

impl<I> ExplorationQueue<I> for BfsQueue<I> {
    fn push(&mut self, item: I) {
        self.queue.push_back(item);
    }

    fn pop(&mut self) -> Option<I> {
        self.queue.pop_front()
    }
}

/// Expands the most recently discovered node first.
///
/// The constructed game is identical to breadth-first exploration up to
/// arena numbering; only discovery order changes.
pub struct DfsQueue<I> {
    queue: Vec<I>,
}

impl<I> DfsQueue<I> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Vec::with_capacity(capacity),
        }
    }
}

impl<I> ExplorationQueue<I> for DfsQueue<I> {
    fn push(&mut self, item: I) {
        self.queue.push(item);
    }

    fn pop(&mut self) -> Option<I> {
        self.queue.pop()
    }
}
