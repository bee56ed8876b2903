// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shared/exclusive lock engine: wait queues, sweeps, and the manager actor

mod error;
mod manager;
mod queue;
mod scheduler;
mod service;

pub use error::LockError;
pub use manager::{LockManager, LockSnapshot, ManagerConfig, DEFAULT_SWEEP_INTERVAL};
pub use queue::{WaitQueue, Waiter};
pub use scheduler::SweepScheduler;
pub use service::{LockService, DEFAULT_MAILBOX_CAPACITY};
