// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! swl-storage: durable lock records

pub mod state;
pub mod store;
pub mod wal;
pub mod wal_store;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use state::MaterializedLocks;
pub use store::{LockStore, StoreError};
pub use wal::{Replay, StoreOp, Wal, WalError};
pub use wal_store::WalStore;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryStore, StoreCall};
