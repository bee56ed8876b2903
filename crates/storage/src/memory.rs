// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory lock store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::store::{LockStore, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use swl_core::LockRecord;

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    LoadAll,
    Put { name: String, record: LockRecord },
    Delete { name: String },
}

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<String, LockRecord>,
    calls: Vec<StoreCall>,
    fail_next: Option<String>,
}

/// In-memory [`LockStore`] that records calls
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without recording a call
    pub fn insert(&self, name: impl Into<String>, record: LockRecord) {
        self.lock().records.insert(name.into(), record);
    }

    pub fn get(&self, name: &str) -> Option<LockRecord> {
        self.lock().records.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Make the next call fail with the given message
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_call(
        &self,
        call: StoreCall,
    ) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(message) => Err(StoreError::Unavailable(message)),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn load_all(&self) -> Result<Vec<(String, LockRecord)>, StoreError> {
        let state = self.record_call(StoreCall::LoadAll)?;
        Ok(state
            .records
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect())
    }

    async fn put(&self, name: &str, record: &LockRecord) -> Result<(), StoreError> {
        let mut state = self.record_call(StoreCall::Put {
            name: name.to_string(),
            record: record.clone(),
        })?;
        state.records.insert(name.to_string(), record.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.record_call(StoreCall::Delete {
            name: name.to_string(),
        })?;
        state.records.remove(name);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
