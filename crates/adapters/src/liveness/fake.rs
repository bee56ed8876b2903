// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake liveness oracle for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LivenessError, LivenessOracle};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct FakeState {
    alive: HashSet<String>,
    queries: usize,
    fail_next: Option<String>,
}

/// Fake liveness oracle with a scripted alive set
#[derive(Clone, Debug, Default)]
pub struct FakeLiveness {
    state: Arc<Mutex<FakeState>>,
}

impl FakeLiveness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an oracle reporting the given groups as alive
    pub fn with_alive<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fake = Self::new();
        for group in groups {
            fake.revive(group);
        }
        fake
    }

    /// Mark a context group alive
    pub fn revive(&self, group: impl Into<String>) {
        self.lock().alive.insert(group.into());
    }

    /// Mark a context group dead
    pub fn kill(&self, group: &str) {
        self.lock().alive.remove(group);
    }

    /// Make the next query fail with the given message
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    /// Number of queries answered (including failed ones)
    pub fn queries(&self) -> usize {
        self.lock().queries
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LivenessOracle for FakeLiveness {
    async fn alive_context_groups(&self) -> Result<HashSet<String>, LivenessError> {
        let mut state = self.lock();
        state.queries += 1;
        if let Some(message) = state.fail_next.take() {
            return Err(LivenessError::QueryFailed(message));
        }
        Ok(state.alive.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
