// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of attached context groups
//!
//! A context group is alive while at least one attachment for it is held.
//! Attachments are RAII guards: dropping the last one for a group (e.g. when a
//! connection closes) makes the group dead for the next liveness query.

use super::{LivenessError, LivenessOracle};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Reference-counted set of live context groups
#[derive(Clone, Debug, Default)]
pub struct ContextRegistry {
    groups: Arc<Mutex<HashMap<String, usize>>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a context group alive until the returned attachment is dropped
    pub fn attach(&self, context_group: impl Into<String>) -> ContextAttachment {
        let context_group = context_group.into();
        let mut groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        *groups.entry(context_group.clone()).or_insert(0) += 1;
        ContextAttachment {
            registry: self.clone(),
            context_group,
        }
    }

    pub fn is_alive(&self, context_group: &str) -> bool {
        self.groups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(context_group)
    }

    /// Number of distinct live context groups
    pub fn len(&self) -> usize {
        self.groups.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn detach(&self, context_group: &str) {
        let mut groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(count) = groups.get_mut(context_group) {
            *count -= 1;
            if *count == 0 {
                groups.remove(context_group);
            }
        }
    }
}

#[async_trait]
impl LivenessOracle for ContextRegistry {
    async fn alive_context_groups(&self) -> Result<HashSet<String>, LivenessError> {
        let groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        Ok(groups.keys().cloned().collect())
    }
}

/// Keeps a context group alive while held
#[derive(Debug)]
pub struct ContextAttachment {
    registry: ContextRegistry,
    context_group: String,
}

impl ContextAttachment {
    pub fn context_group(&self) -> &str {
        &self.context_group
    }
}

impl Drop for ContextAttachment {
    fn drop(&mut self) {
        self.registry.detach(&self.context_group);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
