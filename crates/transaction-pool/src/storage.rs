//! The pool's partitioned transaction containers.
//!
//! Four id-indexed partitions (unverified, pending, ready and the invalid id
//! cache) plus the broadcast outbox. The containers are plain data: all
//! locking and cross-container policy lives in the pool itself.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use galena_types::{Transaction, TxId};

/// Current wall-clock time in unix milliseconds.
pub(crate) fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// The pool list a transaction currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Accepted from a peer, not yet validated.
    Unverified,
    /// Validated but not block-eligible: collecting signatures or
    /// future-dated.
    Pending,
    /// Validated, solvent, block-eligible.
    Ready,
}

impl TxStatus {
    /// All lists in lookup order.
    pub const ALL: [Self; 3] = [Self::Unverified, Self::Pending, Self::Ready];

    /// The list label used in query responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction together with the pool-side state attached on admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTransaction {
    pub transaction: Transaction,
    /// Wall-clock admission time in unix milliseconds.
    pub received_at: u64,
    /// Queue for outbound gossip once the transaction reaches the ready
    /// list.
    pub broadcast:   bool,
}

/// The partitioned pool state.
#[derive(Debug, Default)]
pub struct PoolStorage {
    unverified: HashMap<TxId, StoredTransaction>,
    pending:    HashMap<TxId, StoredTransaction>,
    ready:      HashMap<TxId, StoredTransaction>,
    /// Negative cache of ids that failed processing or verification.
    invalid:    HashSet<TxId>,
    /// Transactions awaiting the next broadcast hand-off.
    outbox:     Vec<Transaction>,
}

// === impl PoolStorage ===

impl PoolStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn list_map(&self, status: TxStatus) -> &HashMap<TxId, StoredTransaction> {
        match status {
            TxStatus::Unverified => &self.unverified,
            TxStatus::Pending => &self.pending,
            TxStatus::Ready => &self.ready,
        }
    }

    fn list_map_mut(&mut self, status: TxStatus) -> &mut HashMap<TxId, StoredTransaction> {
        match status {
            TxStatus::Unverified => &mut self.unverified,
            TxStatus::Pending => &mut self.pending,
            TxStatus::Ready => &mut self.ready,
        }
    }

    /// Inserts a transaction into the given list.
    ///
    /// Idempotent: an id that is already present leaves the list untouched
    /// and returns `false`.
    pub fn insert(&mut self, status: TxStatus, stored: StoredTransaction) -> bool {
        let list = self.list_map_mut(status);
        if list.contains_key(&stored.transaction.id) {
            return false
        }
        list.insert(stored.transaction.id.clone(), stored);
        true
    }

    /// Removes a transaction from the given list. A miss is a no-op.
    pub fn remove(&mut self, status: TxStatus, id: &str) -> Option<StoredTransaction> {
        self.list_map_mut(status).remove(id)
    }

    /// Moves every transaction out of the given list.
    pub fn drain(&mut self, status: TxStatus) -> Vec<StoredTransaction> {
        self.list_map_mut(status).drain().map(|(_, stored)| stored).collect()
    }

    pub fn get(&self, status: TxStatus, id: &str) -> Option<&StoredTransaction> {
        self.list_map(status).get(id)
    }

    pub fn get_mut(&mut self, status: TxStatus, id: &str) -> Option<&mut StoredTransaction> {
        self.list_map_mut(status).get_mut(id)
    }

    /// Scans unverified → pending → ready and returns the first hit.
    pub fn lookup(&self, id: &str) -> Option<(&StoredTransaction, TxStatus)> {
        TxStatus::ALL
            .iter()
            .find_map(|status| self.get(*status, id).map(|stored| (stored, *status)))
    }

    /// Whether the id occupies any of the three transaction lists.
    pub fn contains(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    pub fn len(&self, status: TxStatus) -> usize {
        self.list_map(status).len()
    }

    /// Total number of transactions across the three lists. The invalid
    /// cache does not count.
    pub fn total(&self) -> usize {
        self.unverified.len() + self.pending.len() + self.ready.len()
    }

    pub fn iter(&self, status: TxStatus) -> impl Iterator<Item = &StoredTransaction> {
        self.list_map(status).values()
    }

    /// Whether the sender has any block-eligible transaction.
    pub fn ready_has_sender(&self, sender_public_key: &str) -> bool {
        self.ready
            .values()
            .any(|stored| stored.transaction.sender_public_key == sender_public_key)
    }

    pub fn insert_invalid(&mut self, id: TxId) {
        self.invalid.insert(id);
    }

    pub fn is_invalid(&self, id: &str) -> bool {
        self.invalid.contains(id)
    }

    pub fn invalid_len(&self) -> usize {
        self.invalid.len()
    }

    /// Empties the invalid cache, returning how many ids it held.
    pub fn clear_invalid(&mut self) -> usize {
        let cleared = self.invalid.len();
        self.invalid.clear();
        cleared
    }

    pub fn push_outbox(&mut self, transaction: Transaction) {
        self.outbox.push(transaction);
    }

    /// Takes the accumulated broadcast batch, leaving the outbox empty.
    pub fn drain_outbox(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.outbox)
    }
}
