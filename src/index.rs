//! Hash Index Module
//!
//! An in-memory mapping from primary-key value to the `(start, end)` byte
//! range of the **last live record** for that key in a table log. The
//! index is derived state: it is populated by the write path as records
//! are appended and can always be reconstructed by replaying the log.
//!
//! # Replay semantics
//!
//! [`HashIndex::from_log`] walks the log in file order. A tombstone
//! removes its key (tombstoning an already-absent key is tolerated — the
//! engine may have deleted a key that was never indexed); any other record
//! points the key at that record's byte range. After a full replay the
//! index contains exactly the keys whose most recent record is live.
//!
//! # Lookup semantics
//!
//! [`HashIndex::get`] on an absent key fails with
//! [`IndexError::KeyNotFound`]. This error kind is internal: the query
//! layer translates it to an empty result set and never surfaces it.

// ------------------------------------------------------------------------------------------------
// Includes
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use thiserror::Error;
use tracing::{info, trace, warn};

use crate::log::{LogError, TableLog};

/// The primary-key column every table carries.
pub const PRIMARY_KEY: &str = "id";

// ------------------------------------------------------------------------------------------------
// Error Types
// ------------------------------------------------------------------------------------------------

/// Errors returned by hash index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The key has no live record. Translated to an empty result by the
    /// query layer, never propagated to the user.
    #[error("Key {0:?} not found in index")]
    KeyNotFound(String),

    /// Replaying the backing log failed.
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    /// A record in the log is missing its primary-key cell.
    #[error("Record at [{start}, {end}) has no {PRIMARY_KEY:?} cell")]
    MissingPrimaryKey { start: u64, end: u64 },
}

// ------------------------------------------------------------------------------------------------
// Hash Index
// ------------------------------------------------------------------------------------------------

/// Mapping from primary-key value to the byte range of its last live
/// record.
#[derive(Debug, Clone, Default)]
pub struct HashIndex {
    map: HashMap<String, (u64, u64)>,
}

impl HashIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index by replaying `log` in file order.
    pub fn from_log(log: &TableLog) -> Result<Self, IndexError> {
        let mut index = Self::new();

        for entry in log.scan()? {
            let (start, end, record) = entry?;
            let key = record
                .row
                .get(PRIMARY_KEY)
                .ok_or(IndexError::MissingPrimaryKey { start, end })?;

            if record.deleted {
                index.remove(key);
            } else {
                index.set(key, start, end);
            }
        }

        info!(
            "Rebuilt hash index from {} ({} live keys)",
            log.path().display(),
            index.len()
        );
        Ok(index)
    }

    /// Returns the byte range for `key`, or [`IndexError::KeyNotFound`].
    pub fn get(&self, key: &str) -> Result<(u64, u64), IndexError> {
        self.map
            .get(key)
            .copied()
            .ok_or_else(|| IndexError::KeyNotFound(key.to_string()))
    }

    /// Points `key` at the byte range `[start, end)`, replacing any prior
    /// entry.
    pub fn set(&mut self, key: &str, start: u64, end: u64) {
        trace!("Index set {:?} -> [{}, {})", key, start, end);
        self.map.insert(key.to_string(), (start, end));
    }

    /// Removes `key` from the index. Absent keys are tolerated.
    pub fn remove(&mut self, key: &str) {
        if self.map.remove(key).is_none() {
            warn!("Tombstone for unindexed key {:?}", key);
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the index holds no keys.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// Unit tests
// ------------------------------------------------------------------------------------------------
