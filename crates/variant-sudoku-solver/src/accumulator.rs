//! The dirty-handler queue that drives propagation to a fixed point.

use std::collections::VecDeque;

use crate::handler::BoxedHandler;

/// A dirty queue of handlers whose watched cells changed since they last
/// ran.
///
/// Two parallel structures back this type, matching the design's data
/// model: a per-handler membership flag (`in_queue`) and an ordered queue
/// of dirty handler indices. The invariant is always true by construction:
/// a handler is enqueued at most once, and `pop` clears its membership bit
/// before returning it, so re-marking a pending handler is a no-op.
#[derive(Debug)]
pub struct HandlerAccumulator {
    /// `watchers[cell]` is every handler index that watches `cell`.
    watchers: Vec<Vec<usize>>,
    priorities: Vec<i32>,
    in_queue: Vec<bool>,
    queue: VecDeque<usize>,
}

impl HandlerAccumulator {
    /// Builds the cell -> handler watch map from `handlers` and returns an
    /// empty accumulator over it.
    #[must_use]
    pub fn new(num_cells: usize, handlers: &[BoxedHandler]) -> Self {
        let mut watchers = vec![Vec::new(); num_cells];
        let mut priorities = Vec::with_capacity(handlers.len());
        for (idx, handler) in handlers.iter().enumerate() {
            priorities.push(handler.priority());
            for &cell in handler.cells() {
                watchers[cell].push(idx);
            }
        }
        Self {
            watchers,
            priorities,
            in_queue: vec![false; handlers.len()],
            queue: VecDeque::new(),
        }
    }

    /// Marks every handler watching `cell` as dirty.
    pub fn add_for_cell(&mut self, cell: usize) {
        for &handler in &self.watchers[cell] {
            if !self.in_queue[handler] {
                self.in_queue[handler] = true;
                self.queue.push_back(handler);
            }
        }
    }

    /// `true` if any handler is pending.
    #[must_use]
    pub fn has_any(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Dequeues the highest-priority pending handler (ties broken by
    /// enqueue order), clearing its membership bit.
    pub fn pop(&mut self) -> Option<usize> {
        let (best_pos, _) = self
            .queue
            .iter()
            .enumerate()
            .max_by_key(|&(pos, &handler)| (self.priorities[handler], std::cmp::Reverse(pos)))?;
        let handler = self.queue.remove(best_pos)?;
        self.in_queue[handler] = false;
        Some(handler)
    }

    /// Empties the queue without running anything; used on failure or
    /// checkpoint restore.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.in_queue.iter_mut().for_each(|b| *b = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{AllDifferent, Handler};

    fn boxed(cells: &[usize]) -> BoxedHandler {
        Box::new(AllDifferent::new(cells.to_vec()))
    }

    #[test]
    fn add_for_cell_enqueues_watchers_once() {
        let handlers = vec![boxed(&[0, 1, 2]), boxed(&[2, 3, 4])];
        let mut acc = HandlerAccumulator::new(5, &handlers);
        acc.add_for_cell(2);
        assert!(acc.has_any());
        // Both handlers watch cell 2.
        let mut seen = vec![];
        while let Some(h) = acc.pop() {
            seen.push(h);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1]);
        assert!(!acc.has_any());
    }

    #[test]
    fn re_marking_pending_handler_is_a_no_op() {
        let handlers = vec![boxed(&[0, 1])];
        let mut acc = HandlerAccumulator::new(2, &handlers);
        acc.add_for_cell(0);
        acc.add_for_cell(1); // same handler, already queued
        assert_eq!(acc.pop(), Some(0));
        assert_eq!(acc.pop(), None);
    }

    #[test]
    fn clear_empties_queue_and_membership() {
        let handlers = vec![boxed(&[0, 1])];
        let mut acc = HandlerAccumulator::new(2, &handlers);
        acc.add_for_cell(0);
        acc.clear();
        assert!(!acc.has_any());
        assert_eq!(acc.pop(), None);
    }
}
