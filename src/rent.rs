//! Storage-rent accounting over trie nodes.
//!
//! The trie itself only carries the per-node rent timestamp; deciding what
//! is owed belongs to the tracker here, which consumes a narrow projection
//! of node state on every read and rewrite.

use ethereum_types::H256;
use tracing::debug;

use crate::trie::{NodeVersion, Trie};

/// Reference timestamp for nodes stamped with time zero, in seconds since
/// the Unix epoch (early 2018).
pub const RENT_EPOCH_ANCHOR: i64 = 48 * 365 * 24 * 3600;

// each stored byte is billed with a fixed overhead for the node itself
const STORAGE_OVERHEAD_BYTES: u64 = 128;
const RENT_DIVISOR: u64 = 1 << 21;

// cutoffs that keep very small amounts from being collected
const READ_THRESHOLD: u64 = 10_000;
const REWRITE_THRESHOLD: u64 = 1_000;
const READ_MISS_PENALTY: u64 = 5_000;

/// The slice of node state the rent tracker consumes.
pub trait TrieNodeData {
    fn value_length(&self) -> u32;
    fn value_hash(&self) -> Option<H256>;
    /// Timestamp up to which rent has been paid. `None` marks a node that
    /// was never stamped; nothing is ever charged for it.
    fn last_rent_paid_time(&self) -> Option<i64>;
    /// A node the tracker should treat as newly created.
    fn is_new(&self) -> bool {
        self.last_rent_paid_time().is_none()
    }
}

impl TrieNodeData for Trie {
    fn value_length(&self) -> u32 {
        Trie::value_length(self)
    }

    fn value_hash(&self) -> Option<H256> {
        Trie::value_hash(self)
    }

    fn last_rent_paid_time(&self) -> Option<i64> {
        Trie::last_rent_paid_time(self)
    }

    fn is_new(&self) -> bool {
        self.version() != NodeVersion::V2 || Trie::last_rent_paid_time(self).is_none()
    }
}

/// Rent accrued by a value of `value_length` bytes over `time_delta`
/// seconds. Saturates on overflow; a negative delta saturates as well, so a
/// corrupted timestamp cannot turn into a refund.
pub fn storage_rent(value_length: u32, time_delta: i64) -> u64 {
    if time_delta < 0 {
        return u64::MAX;
    }
    (value_length as u64 + STORAGE_OVERHEAD_BYTES)
        .checked_mul(time_delta as u64)
        .map(|total| total / RENT_DIVISOR)
        .unwrap_or(u64::MAX)
}

/// Accumulates rent owed by the nodes touched during an execution window.
pub struct RentTracker {
    current_time: i64,
    rent_due: u64,
}

impl RentTracker {
    pub fn new(current_time: i64) -> Self {
        RentTracker {
            current_time,
            rent_due: 0,
        }
    }

    pub fn rent_due(&self) -> u64 {
        self.rent_due
    }

    pub fn clear_rent_due(&mut self) {
        self.rent_due = 0;
    }

    /// A lookup miss with no later read or write of the same location.
    pub fn penalize_read_miss(&mut self) {
        self.rent_due = self.rent_due.saturating_add(READ_MISS_PENALTY);
    }

    /// Called for each read. A missing node is penalized.
    pub fn track_read(&mut self, node: Option<&dyn TrieNodeData>) {
        match node {
            None => self.penalize_read_miss(),
            Some(node) => self.track_read_rent(node.value_length(), node.last_rent_paid_time()),
        }
    }

    pub fn track_read_rent(&mut self, value_length: u32, paid_until: Option<i64>) {
        let Some(paid_until) = paid_until else {
            return;
        };
        let paid_until = if paid_until == 0 {
            RENT_EPOCH_ANCHOR
        } else {
            paid_until
        };
        let due = storage_rent(value_length, self.current_time - paid_until);
        debug!(due, value_length, "read rent computed");
        if due > READ_THRESHOLD {
            self.rent_due = self.rent_due.saturating_add(due);
        }
    }

    /// Called for each rewrite of an existing node.
    pub fn track_rewrite(&mut self, old: &dyn TrieNodeData, new_value_length: u32) {
        self.track_rewrite_rent(
            old.value_length(),
            old.last_rent_paid_time(),
            new_value_length,
        );
    }

    pub fn track_rewrite_rent(
        &mut self,
        old_value_length: u32,
        paid_until: Option<i64>,
        _new_value_length: u32,
    ) {
        let Some(paid_until) = paid_until else {
            return;
        };
        let paid_until = if paid_until == 0 {
            RENT_EPOCH_ANCHOR
        } else {
            paid_until
        };
        let due = storage_rent(old_value_length, self.current_time - paid_until);
        debug!(due, old_value_length, "rewrite rent computed");
        if due > REWRITE_THRESHOLD {
            self.rent_due = self.rent_due.saturating_add(due);
        }
    }
}
