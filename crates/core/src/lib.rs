// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swl-core: data model for the cross-context lock coordinator
//!
//! This crate provides:
//! - Holder identities and their `%swl%` text encoding
//! - Lock state and its persisted record form
//! - Requests, outcomes, and the single-fire completion signal
//! - A clock abstraction for testable timing

pub mod clock;
pub mod holder;
pub mod lock;
pub mod request;

pub use clock::{Clock, FakeClock, SystemClock};
pub use holder::{HolderKey, HolderKeyError, HOLDER_KEY_SEPARATOR};
pub use lock::{Lock, LockRecord, LockType};
pub use request::{Completion, LockRequest, Outcome, RequestKind, Ticket, TicketState};
