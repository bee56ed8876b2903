// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock manager: admission, grant algorithm, reclamation, persistence
//!
//! The manager owns the lock table, the wait queues and the sweep timers.
//! Every method that mutates them takes `&mut self`, so a caller can never run
//! two evaluations (or an admission and an evaluation) at once.
//!
//! An evaluation pass for one lock name:
//! 1. cancels any pending sweep for the name
//! 2. asks the liveness oracle which context groups are alive
//! 3. drops holders from dead context groups
//! 4. while nobody holds the lock, pops the queue head and grants it if its
//!    context group is alive (dead requests are acknowledged as abandoned)
//! 5. if the lock is shared, grants consecutive shared requests at the head
//! 6. deletes the lock and its record when empty, otherwise persists it and
//!    arms a sweep if requests are still waiting

use crate::error::LockError;
use crate::queue::{WaitQueue, Waiter};
use crate::scheduler::SweepScheduler;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use swl_adapters::LivenessOracle;
use swl_core::{
    Clock, Completion, HolderKey, Lock, LockRequest, LockType, Outcome, HOLDER_KEY_SEPARATOR,
};
use swl_storage::LockStore;
use tracing::{debug, error, info, warn};

/// Default delay between liveness sweeps of a contended lock
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Lock manager tuning
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// How long a contended lock waits before its holders are re-checked
    pub sweep_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Point-in-time view of one lock
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockSnapshot {
    pub name: String,
    pub lock_type: LockType,
    pub holders: Vec<HolderKey>,
    pub waiting: usize,
}

/// Arbiter for named shared/exclusive locks
pub struct LockManager<O, S, C> {
    oracle: O,
    store: S,
    clock: C,
    config: ManagerConfig,
    locks: HashMap<String, Lock>,
    queues: HashMap<String, WaitQueue>,
    sweeps: SweepScheduler,
    bootstrapped: bool,
}

impl<O, S, C> LockManager<O, S, C>
where
    O: LivenessOracle,
    S: LockStore,
    C: Clock,
{
    pub fn new(oracle: O, store: S, clock: C, config: ManagerConfig) -> Self {
        Self {
            oracle,
            store,
            clock,
            config,
            locks: HashMap::new(),
            queues: HashMap::new(),
            sweeps: SweepScheduler::new(),
            bootstrapped: false,
        }
    }

    /// Seed the lock table from the store. Runs once; later calls are no-ops.
    ///
    /// Returns the number of locks restored by this call.
    pub async fn bootstrap(&mut self) -> Result<usize, LockError> {
        if self.bootstrapped {
            return Ok(0);
        }

        let records = self.store.load_all().await?;
        let mut restored = 0;
        for (name, record) in records {
            let (lock, rejected) = Lock::restore(name.as_str(), &record);
            for e in rejected {
                warn!(lock = %name, error = %e, "dropping unreadable holder");
            }
            match lock {
                Some(lock) => {
                    self.locks.insert(name, lock);
                    restored += 1;
                }
                None => warn!(lock = %name, "ignoring stored lock with no holders"),
            }
        }

        self.bootstrapped = true;
        info!(restored, "lock table loaded");
        Ok(restored)
    }

    /// Admit a request, then re-evaluate its lock
    pub async fn submit(
        &mut self,
        request: LockRequest,
        completion: Completion,
    ) -> Result<(), LockError> {
        let name = request.name.clone();
        self.admit(request, completion).await?;
        self.evaluate(&name).await
    }

    /// Validate and apply a request without evaluating.
    ///
    /// A release takes effect immediately and fires its completion. A lock
    /// request is appended to the queue. On validation failure the completion
    /// is dropped unfired, so its ticket resolves to `None`.
    pub async fn admit(
        &mut self,
        request: LockRequest,
        completion: Completion,
    ) -> Result<(), LockError> {
        self.bootstrap().await?;

        if request.name.is_empty() {
            warn!(context = %request.context_group, "rejecting request without a lock name");
            return Err(LockError::InvalidRequest(
                "lock name must be a non-empty string".to_string(),
            ));
        }

        if request.context_group.contains(HOLDER_KEY_SEPARATOR) {
            warn!(lock = %request.name, context = %request.context_group, "rejecting ambiguous context group");
            return Err(LockError::InvalidRequest(format!(
                "context group must not contain '{HOLDER_KEY_SEPARATOR}'"
            )));
        }

        let Some(lock_type) = request.kind.lock_type() else {
            self.release(&request);
            completion.fire(Outcome::Released);
            return Ok(());
        };

        debug!(
            lock = %request.name,
            holder = %request.holder_key(),
            %lock_type,
            "queued"
        );
        self.queues
            .entry(request.name.clone())
            .or_default()
            .push(Waiter {
                request,
                lock_type,
                completion,
            });
        Ok(())
    }

    fn release(&mut self, request: &LockRequest) {
        let key = request.holder_key();
        let Some(lock) = self.locks.get_mut(&request.name) else {
            return;
        };
        if lock.remove_holder(&key) {
            info!(lock = %request.name, holder = %key, "released");
        }
        if lock.is_empty() {
            self.locks.remove(&request.name);
        }
    }

    /// Run one evaluation pass for `name`
    pub async fn evaluate(&mut self, name: &str) -> Result<(), LockError> {
        self.sweeps.cancel(name);

        let alive = match self.oracle.alive_context_groups().await {
            Ok(alive) => alive,
            Err(e) => {
                // Retry later rather than strand the waiters
                if self.waiting(name) > 0 {
                    self.arm_sweep(name);
                } else if !self.locks.contains_key(name) {
                    // A release emptied the lock; nothing is left to decide
                    self.queues.remove(name);
                    self.store.delete(name).await?;
                }
                return Err(e.into());
            }
        };

        let mut current = self.locks.remove(name);
        if let Some(lock) = current.as_mut() {
            for holder in lock.purge_holders(|group| alive.contains(group)) {
                info!(lock = %name, %holder, "reclaimed from vanished context");
            }
        }
        let mut current = current.filter(|lock| !lock.is_empty());

        if let Some(queue) = self.queues.get_mut(name) {
            grant_waiters(name, &mut current, queue, &alive);
        }

        match current {
            None => {
                self.queues.remove(name);
                self.store.delete(name).await?;
                debug!(lock = %name, "lock is free");
            }
            Some(lock) => {
                let record = lock.to_record();
                self.locks.insert(name.to_string(), lock);
                if self.waiting(name) > 0 {
                    self.arm_sweep(name);
                }
                self.store.put(name, &record).await?;
            }
        }

        Ok(())
    }

    /// Earliest pending sweep deadline
    pub fn next_sweep(&mut self) -> Option<Instant> {
        self.sweeps.next_deadline()
    }

    /// Re-evaluate every lock whose sweep is due. Returns how many ran.
    ///
    /// A failing sweep is logged and does not stop the others.
    pub async fn run_due_sweeps(&mut self) -> usize {
        let due = self.sweeps.take_due(self.clock.now());
        for name in &due {
            debug!(lock = %name, "liveness sweep");
            if let Err(e) = self.evaluate(name).await {
                error!(lock = %name, error = %e, "sweep failed");
            }
        }
        due.len()
    }

    pub fn lock(&self, name: &str) -> Option<&Lock> {
        self.locks.get(name)
    }

    /// Number of requests waiting on `name`
    pub fn waiting(&self, name: &str) -> usize {
        self.queues.get(name).map_or(0, WaitQueue::len)
    }

    /// Whether the lock has a queue entry (possibly empty)
    pub fn has_queue(&self, name: &str) -> bool {
        self.queues.contains_key(name)
    }

    pub fn is_sweep_armed(&self, name: &str) -> bool {
        self.sweeps.is_armed(name)
    }

    /// All held locks, sorted by name
    pub fn snapshot(&self) -> Vec<LockSnapshot> {
        let mut snapshot: Vec<_> = self
            .locks
            .values()
            .map(|lock| LockSnapshot {
                name: lock.name.clone(),
                lock_type: lock.lock_type,
                holders: lock.holders().iter().cloned().collect(),
                waiting: self.waiting(&lock.name),
            })
            .collect();
        snapshot.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot
    }

    fn arm_sweep(&mut self, name: &str) {
        let fire_at = self.clock.now() + self.config.sweep_interval;
        self.sweeps.arm(name, fire_at);
    }
}

/// Grant queued requests in arrival order (steps 4 and 5 of a pass)
fn grant_waiters(
    name: &str,
    current: &mut Option<Lock>,
    queue: &mut WaitQueue,
    alive: &HashSet<String>,
) {
    while current.is_none() {
        let Some(waiter) = queue.pop() else {
            break;
        };
        let holder = waiter.request.holder_key();
        if alive.contains(&waiter.request.context_group) {
            info!(lock = %name, %holder, lock_type = %waiter.lock_type, "granted");
            *current = Some(Lock::granted(name, waiter.lock_type, holder));
            waiter.completion.fire(Outcome::Granted);
        } else {
            debug!(lock = %name, %holder, "abandoned request from vanished context");
            waiter.completion.fire(Outcome::Abandoned);
        }
    }

    let Some(lock) = current.as_mut().filter(|lock| lock.is_shared()) else {
        return;
    };
    while queue.head_type() == Some(LockType::Shared) {
        let Some(waiter) = queue.pop() else {
            break;
        };
        let holder = waiter.request.holder_key();
        // Liveness of the requester itself, same as the first grant
        if alive.contains(&waiter.request.context_group) {
            info!(lock = %name, %holder, "granted shared");
            lock.add_holder(holder);
            waiter.completion.fire(Outcome::Granted);
        } else {
            debug!(lock = %name, %holder, "abandoned request from vanished context");
            waiter.completion.fire(Outcome::Abandoned);
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
