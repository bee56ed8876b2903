// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable lock records

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use swl_core::LockRecord;
use thiserror::Error;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupted entry at line {line}: {reason}")]
    Corrupted { line: u64, reason: String },
}

/// Entries read back from a log
#[derive(Debug, Default)]
pub struct Replay {
    /// Valid operations, in log order
    pub ops: Vec<StoreOp>,
    /// First unreadable entry. It and everything after it were skipped.
    pub corrupted: Option<WalError>,
}

/// A single mutation of the lock store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreOp {
    Put { name: String, record: LockRecord },
    Delete { name: String },
}

/// Write-ahead log of store operations
pub struct Wal {
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create a WAL at the given path
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;

        // Count existing entries to set sequence number
        let reader = BufReader::new(File::open(path)?);
        let sequence = reader.lines().count() as u64;

        Ok(Self { file, sequence })
    }

    /// Replace the log at `path` with exactly `ops`, atomically
    pub fn rewrite(path: &Path, ops: &[StoreOp]) -> Result<Self, WalError> {
        let tmp = tmp_path(path);
        {
            let mut file = File::create(&tmp)?;
            for (i, op) in ops.iter().enumerate() {
                let entry = WalEntry {
                    seq: i as u64 + 1,
                    op: op.clone(),
                };
                writeln!(file, "{}", serde_json::to_string(&entry)?)?;
            }
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Self::open(path)
    }

    /// Append an operation to the log
    pub fn append(&mut self, op: &StoreOp) -> Result<u64, WalError> {
        self.sequence += 1;
        let entry = WalEntry {
            seq: self.sequence,
            op: op.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Replay operations from the log
    ///
    /// Stops at the first entry that fails to parse (e.g. a write torn by a
    /// crash) and reports it in [`Replay::corrupted`].
    pub fn replay(path: &Path) -> Result<Replay, WalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Replay::default()),
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut replay = Replay::default();

        for (index, line) in reader.lines().enumerate() {
            let line_number = index as u64 + 1;
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    replay.corrupted = Some(WalError::Corrupted {
                        line: line_number,
                        reason: e.to_string(),
                    });
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<WalEntry>(&line) {
                Ok(entry) => replay.ops.push(entry.op),
                Err(e) => {
                    replay.corrupted = Some(WalError::Corrupted {
                        line: line_number,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        Ok(replay)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[derive(Debug, Serialize, Deserialize)]
struct WalEntry {
    seq: u64,
    op: StoreOp,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
