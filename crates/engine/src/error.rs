// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the lock manager

use swl_adapters::LivenessError;
use swl_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by lock admission and evaluation
#[derive(Debug, Error)]
pub enum LockError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("liveness error: {0}")]
    Liveness(#[from] LivenessError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("lock service stopped")]
    ServiceStopped,
}
