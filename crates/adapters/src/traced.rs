// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::liveness::{LivenessError, LivenessOracle};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::Instrument;

/// Wrapper that adds tracing to any LivenessOracle
#[derive(Clone, Debug)]
pub struct TracedLivenessOracle<L> {
    inner: L,
}

impl<L> TracedLivenessOracle<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LivenessOracle> LivenessOracle for TracedLivenessOracle<L> {
    async fn alive_context_groups(&self) -> Result<HashSet<String>, LivenessError> {
        let span = tracing::debug_span!("liveness.query");

        async {
            let start = std::time::Instant::now();
            let result = self.inner.alive_context_groups().await;
            let elapsed = start.elapsed();

            match &result {
                Ok(alive) => tracing::trace!(
                    alive = alive.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "queried"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "query failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
