// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock store backed by a write-ahead log

use crate::state::MaterializedLocks;
use crate::store::{LockStore, StoreError};
use crate::wal::{StoreOp, Wal};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use swl_core::LockRecord;
use tracing::warn;

struct Inner {
    wal: Wal,
    state: MaterializedLocks,
}

/// WAL-backed [`LockStore`]
///
/// Every mutation is appended and synced before returning. On open the log is
/// replayed up to the first unreadable entry, and compacted to one `put` per
/// live record when it has grown beyond that or had a bad tail.
#[derive(Clone)]
pub struct WalStore {
    path: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

impl WalStore {
    /// Open or create the store at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let replay = Wal::replay(path)?;
        let state = MaterializedLocks::from_ops(&replay.ops);

        if let Some(e) = &replay.corrupted {
            warn!(path = %path.display(), error = %e, "discarding unreadable log tail");
        }

        // Rewriting also drops a torn tail, so later appends start on a clean line
        let wal = if replay.corrupted.is_some() || replay.ops.len() > state.len() {
            Wal::rewrite(path, &state.to_ops())?
        } else {
            Wal::open(path)?
        };

        Ok(Self {
            path: path.to_path_buf(),
            inner: Arc::new(Mutex::new(Inner { wal, state })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.lock().state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries currently in the log
    pub fn log_sequence(&self) -> u64 {
        self.lock().wal.sequence()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.wal.append(&op)?;
        inner.state.apply(&op);
        Ok(())
    }
}

#[async_trait]
impl LockStore for WalStore {
    async fn load_all(&self) -> Result<Vec<(String, LockRecord)>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .state
            .records()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect())
    }

    async fn put(&self, name: &str, record: &LockRecord) -> Result<(), StoreError> {
        if self.lock().state.get(name) == Some(record) {
            return Ok(());
        }
        self.write(StoreOp::Put {
            name: name.to_string(),
            record: record.clone(),
        })
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        if self.lock().state.get(name).is_none() {
            return Ok(());
        }
        self.write(StoreOp::Delete {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "wal_store_tests.rs"]
mod tests;
