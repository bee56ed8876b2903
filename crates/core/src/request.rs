// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock requests and their completion signal

use crate::holder::HolderKey;
use crate::lock::LockType;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::oneshot;

/// What a request asks for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Shared,
    Exclusive,
    #[default]
    Release,
}

impl RequestKind {
    /// Lock mode requested, or `None` for a release
    pub fn lock_type(&self) -> Option<LockType> {
        match self {
            RequestKind::Shared => Some(LockType::Shared),
            RequestKind::Exclusive => Some(LockType::Exclusive),
            RequestKind::Release => None,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Shared => f.write_str("shared"),
            RequestKind::Exclusive => f.write_str("exclusive"),
            RequestKind::Release => f.write_str("release"),
        }
    }
}

impl FromStr for RequestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shared" => Ok(RequestKind::Shared),
            "exclusive" => Ok(RequestKind::Exclusive),
            "release" | "" => Ok(RequestKind::Release),
            other => Err(format!("unknown request type: {other}")),
        }
    }
}

// null and "" both mean release; pair with #[serde(default)] for a missing field
impl<'de> Deserialize<'de> for RequestKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(RequestKind::Release),
            Some(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A request delivered to the lock manager
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockRequest {
    pub name: String,
    pub kind: RequestKind,
    pub context_group: String,
    pub sub_context: String,
}

impl LockRequest {
    pub fn new(
        name: impl Into<String>,
        kind: RequestKind,
        context_group: impl Into<String>,
        sub_context: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            context_group: context_group.into(),
            sub_context: sub_context.into(),
        }
    }

    pub fn shared(
        name: impl Into<String>,
        context_group: impl Into<String>,
        sub_context: impl Into<String>,
    ) -> Self {
        Self::new(name, RequestKind::Shared, context_group, sub_context)
    }

    pub fn exclusive(
        name: impl Into<String>,
        context_group: impl Into<String>,
        sub_context: impl Into<String>,
    ) -> Self {
        Self::new(name, RequestKind::Exclusive, context_group, sub_context)
    }

    pub fn release(
        name: impl Into<String>,
        context_group: impl Into<String>,
        sub_context: impl Into<String>,
    ) -> Self {
        Self::new(name, RequestKind::Release, context_group, sub_context)
    }

    pub fn holder_key(&self) -> HolderKey {
        HolderKey::new(self.context_group.clone(), self.sub_context.clone())
    }
}

/// How a request was concluded
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The requester now holds the lock
    Granted,
    /// The release was applied
    Released,
    /// Popped from the queue while its context group was gone; not granted
    Abandoned,
}

/// Single-fire completion signal for a request
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Outcome>,
}

impl Completion {
    /// Create a completion and the ticket that observes it
    pub fn channel() -> (Completion, Ticket) {
        let (tx, rx) = oneshot::channel();
        (Completion { tx }, Ticket { rx })
    }

    /// Fire the signal. A requester that stopped waiting is not an error.
    pub fn fire(self, outcome: Outcome) {
        let _ = self.tx.send(outcome);
    }
}

/// State of a ticket when polled without waiting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketState {
    Pending,
    Ready(Outcome),
    /// The completion was dropped without firing
    Dropped,
}

/// Requester side of a [`Completion`]
#[derive(Debug)]
pub struct Ticket {
    rx: oneshot::Receiver<Outcome>,
}

impl Ticket {
    /// Wait for the outcome. `None` if the completion was dropped unfired.
    pub async fn wait(self) -> Option<Outcome> {
        self.rx.await.ok()
    }

    /// Check the outcome without waiting
    pub fn poll_state(&mut self) -> TicketState {
        match self.rx.try_recv() {
            Ok(outcome) => TicketState::Ready(outcome),
            Err(oneshot::error::TryRecvError::Empty) => TicketState::Pending,
            Err(oneshot::error::TryRecvError::Closed) => TicketState::Dropped,
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
