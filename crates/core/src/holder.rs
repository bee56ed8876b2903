// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Holder identity for granted locks
//!
//! A holder is a `(context_group, sub_context)` pair. The context group is the
//! execution context whose liveness the coordinator can query; the sub-context
//! is an opaque string the requester picks to tell apart several logical
//! holders inside one context group.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the context group and sub-context in encoded keys
pub const HOLDER_KEY_SEPARATOR: &str = "%swl%";

/// Errors from decoding an encoded holder key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HolderKeyError {
    #[error("holder key has no '{HOLDER_KEY_SEPARATOR}' separator: {0:?}")]
    MissingSeparator(String),
}

/// Composite identity of a lock holder
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HolderKey {
    context_group: String,
    sub_context: String,
}

impl HolderKey {
    pub fn new(context_group: impl Into<String>, sub_context: impl Into<String>) -> Self {
        Self {
            context_group: context_group.into(),
            sub_context: sub_context.into(),
        }
    }

    pub fn context_group(&self) -> &str {
        &self.context_group
    }

    pub fn sub_context(&self) -> &str {
        &self.sub_context
    }

    /// Encode as `<context_group>%swl%<sub_context>`
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HolderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.context_group, HOLDER_KEY_SEPARATOR, self.sub_context
        )
    }
}

impl FromStr for HolderKey {
    type Err = HolderKeyError;

    /// Split on the first separator; anything after it belongs to the sub-context.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(HOLDER_KEY_SEPARATOR) {
            Some((group, sub)) => Ok(Self::new(group, sub)),
            None => Err(HolderKeyError::MissingSeparator(s.to_string())),
        }
    }
}

impl TryFrom<String> for HolderKey {
    type Error = HolderKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HolderKey> for String {
    fn from(key: HolderKey) -> Self {
        key.encode()
    }
}

#[cfg(test)]
#[path = "holder_tests.rs"]
mod tests;
