// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FIFO wait queue for one lock name

use std::collections::VecDeque;
use swl_core::{Completion, LockRequest, LockType};

/// A request waiting for a lock
#[derive(Debug)]
pub struct Waiter {
    pub request: LockRequest,
    pub lock_type: LockType,
    pub completion: Completion,
}

/// Pending requests for a single lock, in arrival order
#[derive(Debug, Default)]
pub struct WaitQueue {
    entries: VecDeque<Waiter>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, waiter: Waiter) {
        self.entries.push_back(waiter);
    }

    pub fn pop(&mut self) -> Option<Waiter> {
        self.entries.pop_front()
    }

    /// Lock type requested by the head of the queue
    pub fn head_type(&self) -> Option<LockType> {
        self.entries.front().map(|w| w.lock_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waiter> {
        self.entries.iter()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
