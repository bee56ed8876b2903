// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named lock state
//!
//! A [`Lock`] only exists while it has at least one holder. Exclusive locks
//! have exactly one holder; shared locks may have many.

use crate::holder::{HolderKey, HolderKeyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Lock mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockType {
    Shared,
    Exclusive,
}

impl LockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockType::Shared => "shared",
            LockType::Exclusive => "exclusive",
        }
    }
}

impl fmt::Display for LockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A held lock
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lock {
    pub name: String,
    pub lock_type: LockType,
    holders: BTreeSet<HolderKey>,
}

impl Lock {
    /// Create a lock granted to a single holder
    pub fn granted(name: impl Into<String>, lock_type: LockType, holder: HolderKey) -> Self {
        Self {
            name: name.into(),
            lock_type,
            holders: BTreeSet::from([holder]),
        }
    }

    pub fn holders(&self) -> &BTreeSet<HolderKey> {
        &self.holders
    }

    pub fn is_held_by(&self, holder: &HolderKey) -> bool {
        self.holders.contains(holder)
    }

    /// No holders left; the lock should be torn down
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn is_shared(&self) -> bool {
        self.lock_type == LockType::Shared
    }

    /// Add a co-holder. Returns false if the holder was already present.
    pub fn add_holder(&mut self, holder: HolderKey) -> bool {
        self.holders.insert(holder)
    }

    /// Remove a holder. Returns false if it was not holding the lock.
    pub fn remove_holder(&mut self, holder: &HolderKey) -> bool {
        self.holders.remove(holder)
    }

    /// Drop every holder whose context group fails `is_alive`, returning the removed keys
    pub fn purge_holders(&mut self, mut is_alive: impl FnMut(&str) -> bool) -> Vec<HolderKey> {
        let (kept, removed): (BTreeSet<_>, BTreeSet<_>) = std::mem::take(&mut self.holders)
            .into_iter()
            .partition(|holder| is_alive(holder.context_group()));
        self.holders = kept;
        removed.into_iter().collect()
    }

    /// Persisted form of this lock
    pub fn to_record(&self) -> LockRecord {
        LockRecord {
            lock_type: self.lock_type,
            holders: self.holders.iter().map(HolderKey::encode).collect(),
        }
    }

    /// Rebuild a lock from its persisted form.
    ///
    /// Holder keys that fail to decode are dropped and returned alongside. A
    /// record left without holders yields no lock.
    pub fn restore(
        name: impl Into<String>,
        record: &LockRecord,
    ) -> (Option<Lock>, Vec<HolderKeyError>) {
        let mut holders = BTreeSet::new();
        let mut rejected = Vec::new();
        for encoded in &record.holders {
            match encoded.parse::<HolderKey>() {
                Ok(key) => {
                    holders.insert(key);
                }
                Err(e) => rejected.push(e),
            }
        }

        if holders.is_empty() {
            return (None, rejected);
        }

        let lock = Lock {
            name: name.into(),
            lock_type: record.lock_type,
            holders,
        };
        (Some(lock), rejected)
    }
}

/// Stored representation of a lock, keyed externally by lock name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    #[serde(rename = "type")]
    pub lock_type: LockType,
    /// Encoded [`HolderKey`]s
    pub holders: BTreeSet<String>,
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
