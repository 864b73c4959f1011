//! Galena's transaction mempool.
//!
//! The in-memory staging area between transaction ingress and block
//! production.
//!
//! ## Functionality
//!
//! The transaction pool is responsible for
//!
//!    - admitting candidate transactions from local clients (fully verified)
//!      and remote peers (verified lazily on the promotion tick)
//!    - enforcing per-sender solvency across all block-eligible spend
//!    - holding multisignature transactions while co-signatures are
//!      collected
//!    - expiring stale entries and clearing the negative cache of known
//!      invalid ids
//!    - exposing a deterministically ordered ready view to the block
//!      producer
//!
//! ## Architecture
//!
//! State is partitioned into three id-indexed lists (`unverified`, `pending`
//! and `ready`) plus the invalid id cache and a broadcast outbox. All of it
//! is owned by the pool internals behind a single lock; the [`Mempool`]
//! handle is just an `Arc` wrapper around them, so every consumer (ingress
//! handlers, the background jobs, the block producer) shares one pool.
//!
//! External collaborators (the account store, the transaction logic, key
//! derivation and the message bus) are constructor-supplied capabilities
//! consumed through [`AccountStore`], [`TransactionLogic`],
//! [`KeyDerivation`] and [`MessageBus`]. The pool never holds their results
//! across ticks and never holds its lock across a call into them.
//!
//! The background jobs ([`maintain`]) drive the lifecycle: the promotion
//! loop drains `unverified` and promotes completed `pending` entries, the
//! expiry sweep drops transactions that outlived their per-type timeout and
//! the invalid-cache reset gives rejected ids a second chance.

use std::sync::Arc;

use alloy_primitives::I256;
use galena_types::Transaction;

pub mod error;
pub mod jobs;
pub mod maintain;

mod balance;
mod config;
mod pool;
mod storage;
mod traits;

pub use config::PoolConfig;
pub use error::{BoxError, PoolError, PoolResult};
pub use jobs::JobsQueue;
pub use maintain::{EXPIRY_JOB, INVALID_RESET_JOB, PROCESS_JOB};
pub use pool::{GetAllParams, GetAllResponse, PoolUsage};
pub use storage::{StoredTransaction, TxStatus};
pub use traits::{AccountStore, KeyDerivation, MessageBus, TransactionLogic, BROADCAST_TOPIC};

use crate::pool::PoolInner;

/// A shareable handle to the transaction pool.
pub struct Mempool<A, L, K, B> {
    inner: Arc<PoolInner<A, L, K, B>>,
}

// === impl Mempool ===

impl<A, L, K, B> Mempool<A, L, K, B>
where
    A: AccountStore,
    L: TransactionLogic,
    K: KeyDerivation,
    B: MessageBus,
{
    /// Creates a new pool over the given collaborators.
    pub fn new(config: PoolConfig, accounts: A, logic: L, keys: K, bus: B) -> Self {
        Self { inner: Arc::new(PoolInner::new(config, accounts, logic, keys, bus)) }
    }

    /// Get the config the pool was configured with.
    pub fn config(&self) -> &PoolConfig {
        self.inner.config()
    }

    /// Admits a transaction from a local client, running the full
    /// verification pipeline before placement.
    ///
    /// With `broadcast` set, the transaction is queued for outbound gossip
    /// once it reaches the ready list.
    pub async fn add_from_public(
        &self,
        transaction: Transaction,
        broadcast: bool,
    ) -> PoolResult<TxStatus> {
        self.inner.add_from_public(transaction, broadcast).await
    }

    /// Admits a batch received from a peer into the unverified list.
    ///
    /// Cryptographic verification and the solvency check are deferred to the
    /// next promotion tick. The batch is processed in order and
    /// short-circuits on the first failure.
    pub async fn add_from_peer(
        &self,
        transactions: Vec<Transaction>,
        broadcast: bool,
    ) -> PoolResult<()> {
        self.inner.add_from_peer(transactions, broadcast).await
    }

    /// Derives a keypair from `secret` and appends its signature to the
    /// pending multisignature transaction `id`.
    pub fn add_signature(&self, id: &str, secret: &str) -> PoolResult<()> {
        self.inner.add_signature(id, secret)
    }

    /// Looks up a transaction in any list.
    pub fn get(&self, id: &str) -> Option<(Transaction, TxStatus)> {
        self.inner.get(id)
    }

    /// Filtered enumeration of the pool, see [`GetAllResponse`].
    pub fn get_all(&self, filter: &str, params: &GetAllParams) -> GetAllResponse {
        self.inner.get_all(filter, params)
    }

    /// The forger view: ready transactions ordered by fee (descending),
    /// admission time (ascending) and id (descending), truncated to `limit`.
    pub fn get_ready(&self, limit: Option<usize>) -> Vec<Transaction> {
        self.inner.get_ready(limit)
    }

    /// Occupancy counters for all lists.
    pub fn get_usage(&self) -> PoolUsage {
        self.inner.get_usage()
    }

    /// Removes `id` from every transaction list, returning the first list
    /// that held it.
    pub fn delete(&self, id: &str) -> Option<TxStatus> {
        self.inner.delete(id)
    }

    /// Unconditionally moves a batch into the ready list with a shared fresh
    /// admission time.
    pub fn add_ready(&self, transactions: Vec<Transaction>) {
        self.inner.add_ready(transactions)
    }

    /// Checks that the sender of `transaction` can cover it on top of its
    /// ready spend; returns the projected balance.
    pub async fn check_balance(&self, transaction: &Transaction) -> PoolResult<I256> {
        self.inner.check_balance(transaction).await
    }

    /// Reconciles the pool after a block was applied.
    pub async fn sanitize_transactions(&self, transactions: Vec<Transaction>) {
        self.inner.sanitize_transactions(transactions).await
    }

    /// Runs one promotion tick: drain unverified, promote pending, publish
    /// the broadcast batch.
    pub async fn process_pool(&self) {
        self.inner.process_pool().await
    }

    /// Evicts transactions that outlived their per-type timeout.
    pub fn expire_transactions(&self) {
        self.inner.expire_transactions()
    }

    /// Empties the invalid id cache.
    pub fn reset_invalid_transactions(&self) {
        self.inner.reset_invalid_transactions()
    }

    /// Number of transactions across the unverified, pending and ready
    /// lists.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the pool holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<A, L, K, B> Clone for Mempool<A, L, K, B> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}
