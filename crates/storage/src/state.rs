// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized lock records from WAL replay

use crate::wal::StoreOp;
use std::collections::BTreeMap;
use swl_core::LockRecord;

/// Current record per lock name, built from WAL operations
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MaterializedLocks {
    records: BTreeMap<String, LockRecord>,
}

impl MaterializedLocks {
    /// Build state by applying every operation in order
    pub fn from_ops<'a>(ops: impl IntoIterator<Item = &'a StoreOp>) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &StoreOp) {
        match op {
            StoreOp::Put { name, record } => {
                self.records.insert(name.clone(), record.clone());
            }
            StoreOp::Delete { name } => {
                self.records.remove(name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&LockRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = (&String, &LockRecord)> {
        self.records.iter()
    }

    /// Minimal operation list that reproduces this state
    pub fn to_ops(&self) -> Vec<StoreOp> {
        self.records
            .iter()
            .map(|(name, record)| StoreOp::Put {
                name: name.clone(),
                record: record.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
