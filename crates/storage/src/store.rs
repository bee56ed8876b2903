// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent store interface for lock records

use crate::wal::WalError;
use async_trait::async_trait;
use swl_core::LockRecord;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable mapping from lock name to lock record
///
/// Only the lock table is stored. Wait queues live in memory and are lost on
/// restart.
#[async_trait]
pub trait LockStore: Clone + Send + Sync + 'static {
    /// Every stored record; used once at bootstrap
    async fn load_all(&self) -> Result<Vec<(String, LockRecord)>, StoreError>;

    /// Insert or replace the record for `name`
    async fn put(&self, name: &str, record: &LockRecord) -> Result<(), StoreError>;

    /// Remove the record for `name`; absent names are not an error
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}
