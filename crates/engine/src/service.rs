// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-writer actor around the lock manager
//!
//! One task owns the [`LockManager`] and drains a bounded mailbox. Each
//! admission (with its evaluation pass) and each due sweep runs to completion
//! before the next command is taken, so passes for the same lock never
//! interleave.

use crate::error::LockError;
use crate::manager::{LockManager, LockSnapshot};
use std::time::Instant;
use swl_adapters::LivenessOracle;
use swl_core::{Clock, Completion, LockRequest, Ticket};
use swl_storage::LockStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Default mailbox depth
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

enum Command {
    Submit {
        request: LockRequest,
        completion: Completion,
        reply: oneshot::Sender<Result<(), LockError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<LockSnapshot>>,
    },
    Shutdown,
}

/// Handle to a running lock manager task
#[derive(Clone, Debug)]
pub struct LockService {
    tx: mpsc::Sender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Submit { request, .. } => f.debug_tuple("Submit").field(request).finish(),
            Command::Snapshot { .. } => f.write_str("Snapshot"),
            Command::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl LockService {
    /// Move the manager into its own task
    pub fn spawn<O, S, C>(manager: LockManager<O, S, C>, capacity: usize) -> (Self, JoinHandle<()>)
    where
        O: LivenessOracle,
        S: LockStore,
        C: Clock,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run(manager, rx));
        (Self { tx }, handle)
    }

    /// Submit a request and get a ticket for its outcome.
    ///
    /// Fails only when the request is rejected at admission or the service
    /// has stopped. Errors from the evaluation pass are logged by the service;
    /// the ticket stays valid and resolves once the request is decided.
    pub async fn submit(&self, request: LockRequest) -> Result<Ticket, LockError> {
        let (completion, ticket) = Completion::channel();
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Command::Submit {
                request,
                completion,
                reply,
            })
            .await
            .map_err(|_| LockError::ServiceStopped)?;
        response.await.map_err(|_| LockError::ServiceStopped)??;
        Ok(ticket)
    }

    /// Current lock table
    pub async fn snapshot(&self) -> Result<Vec<LockSnapshot>, LockError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Command::Snapshot { reply })
            .await
            .map_err(|_| LockError::ServiceStopped)?;
        response.await.map_err(|_| LockError::ServiceStopped)
    }

    /// Ask the task to stop. Requests still queued are dropped unanswered.
    pub async fn shutdown(&self) -> Result<(), LockError> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| LockError::ServiceStopped)
    }
}

async fn run<O, S, C>(mut manager: LockManager<O, S, C>, mut rx: mpsc::Receiver<Command>)
where
    O: LivenessOracle,
    S: LockStore,
    C: Clock,
{
    loop {
        let deadline = manager.next_sweep();
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else {
                    break;
                };
                debug!(?command, "lock service command");
                match command {
                    Command::Submit { request, completion, reply } => {
                        let result = handle_submit(&mut manager, request, completion).await;
                        let _ = reply.send(result);
                    }
                    Command::Snapshot { reply } => {
                        let _ = reply.send(manager.snapshot());
                    }
                    Command::Shutdown => break,
                }
            }
            _ = sleep_until(deadline) => {
                manager.run_due_sweeps().await;
            }
        }
    }

    info!("lock service stopped");
}

async fn handle_submit<O, S, C>(
    manager: &mut LockManager<O, S, C>,
    request: LockRequest,
    completion: Completion,
) -> Result<(), LockError>
where
    O: LivenessOracle,
    S: LockStore,
    C: Clock,
{
    let name = request.name.clone();
    manager.admit(request, completion).await?;
    if let Err(e) = manager.evaluate(&name).await {
        error!(lock = %name, error = %e, "evaluation failed");
    }
    Ok(())
}

/// Sleep until the next sweep, or forever if none is armed
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
