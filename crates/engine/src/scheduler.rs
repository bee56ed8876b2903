// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness sweep timers, one per contended lock name

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

/// Cancellable, re-armable sweep deadlines keyed by lock name
///
/// Re-arming replaces the previous deadline. Superseded heap entries are
/// discarded lazily when they reach the top.
#[derive(Debug, Default)]
pub struct SweepScheduler {
    armed: HashMap<String, Instant>,
    heap: BinaryHeap<Reverse<(Instant, String)>>,
}

impl SweepScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the sweep for `name`
    pub fn arm(&mut self, name: &str, fire_at: Instant) {
        self.armed.insert(name.to_string(), fire_at);
        self.heap.push(Reverse((fire_at, name.to_string())));
    }

    /// Cancel the sweep for `name`. Returns true if one was armed.
    pub fn cancel(&mut self, name: &str) -> bool {
        self.armed.remove(name).is_some()
    }

    pub fn is_armed(&self, name: &str) -> bool {
        self.armed.contains_key(name)
    }

    /// Number of armed sweeps
    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Earliest armed deadline
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_stale();
        self.heap.peek().map(|Reverse((at, _))| *at)
    }

    /// Disarm and return every name whose deadline is at or before `now`
    pub fn take_due(&mut self, now: Instant) -> Vec<String> {
        let mut due = Vec::new();

        while let Some(Reverse((fire_at, _))) = self.heap.peek() {
            if *fire_at > now {
                break;
            }
            let Some(Reverse((fire_at, name))) = self.heap.pop() else {
                break;
            };
            if self.armed.get(&name) == Some(&fire_at) {
                self.armed.remove(&name);
                due.push(name);
            }
        }

        due
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse((fire_at, name))) = self.heap.peek() {
            if self.armed.get(name) == Some(fire_at) {
                break;
            }
            self.heap.pop();
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
