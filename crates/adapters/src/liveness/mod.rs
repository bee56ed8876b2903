// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness oracle adapters
//!
//! The lock manager asks the oracle which context groups are alive at the
//! start of every evaluation pass. Holders from any other group are reclaimed.

mod registry;

pub use registry::{ContextAttachment, ContextRegistry};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeLiveness;

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

/// Errors from liveness queries
#[derive(Debug, Clone, Error)]
pub enum LivenessError {
    #[error("liveness query failed: {0}")]
    QueryFailed(String),
}

/// Source of truth for which context groups currently exist
#[async_trait]
pub trait LivenessOracle: Clone + Send + Sync + 'static {
    /// Identifiers of every context group alive right now
    async fn alive_context_groups(&self) -> Result<HashSet<String>, LivenessError>;
}
