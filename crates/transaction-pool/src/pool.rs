//! The pool internals: admission pipeline, multisig signing and the query &
//! maintenance API.

use alloy_primitives::I256;
use galena_types::{constants::real_time_ms, Account, Transaction, TransactionType, TxId};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::{
    balance,
    config::PoolConfig,
    error::{PoolError, PoolResult},
    storage::{wall_clock_ms, PoolStorage, StoredTransaction, TxStatus},
    traits::{AccountStore, KeyDerivation, MessageBus, TransactionLogic},
};

/// Options for [`get_all`](crate::Mempool::get_all).
#[derive(Debug, Clone, Default)]
pub struct GetAllParams {
    /// Matched value for the sender/recipient field filters: an address or a
    /// public key depending on the filter.
    pub id:      Option<String>,
    /// Reverse the admission-time ordering of the list filters.
    pub reverse: bool,
    /// Truncate the list filters to this many entries.
    pub limit:   Option<usize>,
}

/// Result of a filtered enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetAllResponse {
    /// A single pool list ordered by admission time.
    List(Vec<Transaction>),
    /// Transactions matching a field filter, grouped by list.
    Grouped {
        unverified: Vec<Transaction>,
        pending:    Vec<Transaction>,
        ready:      Vec<Transaction>,
    },
    /// The filter was not recognised. Carries the diagnostic message.
    UnknownFilter(String),
}

/// Occupancy counters for the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolUsage {
    pub unverified: usize,
    pub pending:    usize,
    pub ready:      usize,
    pub invalid:    usize,
    pub total:      usize,
}

/// The actual pool state and its collaborators.
///
/// All container mutation happens synchronously under the storage lock;
/// external calls (account store, transaction logic, bus) are awaited with
/// the lock released.
pub(crate) struct PoolInner<A, L, K, B> {
    pub(crate) config:   PoolConfig,
    pub(crate) storage:  RwLock<PoolStorage>,
    pub(crate) accounts: A,
    pub(crate) logic:    L,
    pub(crate) keys:     K,
    pub(crate) bus:      B,
}

// === impl PoolInner ===

impl<A, L, K, B> PoolInner<A, L, K, B>
where
    A: AccountStore,
    L: TransactionLogic,
    K: KeyDerivation,
    B: MessageBus,
{
    pub(crate) fn new(config: PoolConfig, accounts: A, logic: L, keys: K, bus: B) -> Self {
        Self { config, storage: RwLock::new(PoolStorage::new()), accounts, logic, keys, bus }
    }

    pub(crate) fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Admits a transaction from a local client: the full verification
    /// pipeline runs before placement.
    pub(crate) async fn add_from_public(
        &self,
        mut transaction: Transaction,
        broadcast: bool,
    ) -> PoolResult<TxStatus> {
        let sender = self.process_transaction(&mut transaction).await?;

        if let Err(cause) = self.logic.verify(&transaction, &sender).await {
            self.mark_invalid(&transaction.id);
            return Err(PoolError::Verify(cause))
        }

        self.check_unique_type(&transaction)?;

        transaction.sender_id.get_or_insert_with(|| sender.address.clone());
        self.check_balance(&transaction).await?;

        Ok(self.route_verified(transaction, wall_clock_ms(), broadcast))
    }

    /// Admits a batch from a remote peer into the unverified list.
    ///
    /// Only the cheap stages run here; cryptographic verification and the
    /// solvency check are deferred to the promotion loop. Transactions are
    /// processed in list order and the batch short-circuits on the first
    /// failure.
    pub(crate) async fn add_from_peer(
        &self,
        transactions: Vec<Transaction>,
        broadcast: bool,
    ) -> PoolResult<()> {
        for mut transaction in transactions {
            let sender = self.process_transaction(&mut transaction).await?;
            transaction.sender_id.get_or_insert_with(|| sender.address.clone());

            let stored =
                StoredTransaction { transaction, received_at: wall_clock_ms(), broadcast };
            self.storage.write().insert(TxStatus::Unverified, stored);
        }
        Ok(())
    }

    /// Shared admission stages: capacity and duplicate checks, sender fetch,
    /// requester resolution and type-specific processing.
    async fn process_transaction(&self, transaction: &mut Transaction) -> PoolResult<Account> {
        self.check_admission(transaction)?;

        let sender = self
            .accounts
            .get_sender(&transaction.sender_public_key)
            .await
            .map_err(PoolError::SenderLookup)?;
        let requester = self.resolve_requester(transaction, &sender).await?;

        if let Err(cause) = self.logic.process(transaction, &sender, requester.as_ref()).await {
            self.mark_invalid(&transaction.id);
            return Err(PoolError::Process(cause))
        }

        Ok(sender)
    }

    fn check_admission(&self, transaction: &Transaction) -> PoolResult<()> {
        let storage = self.storage.read();
        if storage.is_invalid(&transaction.id) {
            return Err(PoolError::AlreadyInvalid(transaction.id.clone()))
        }
        if storage.contains(&transaction.id) {
            return Err(PoolError::DuplicateInPool(transaction.id.clone()))
        }
        if storage.total() >= self.config.storage_limit {
            return Err(PoolError::PoolFull)
        }
        Ok(())
    }

    /// Resolves the requester account for multisignature senders and makes
    /// sure such transactions carry an initialised signature list.
    async fn resolve_requester(
        &self,
        transaction: &mut Transaction,
        sender: &Account,
    ) -> PoolResult<Option<Account>> {
        if !sender.is_multisig() {
            return Ok(None)
        }
        if transaction.signatures.is_none() {
            transaction.signatures = Some(Vec::new());
        }
        let Some(requester_key) = transaction.requester_public_key.clone() else {
            return Ok(None)
        };
        self.accounts
            .get_account(&requester_key)
            .await
            .map_err(PoolError::SenderLookup)?
            .map(Some)
            .ok_or(PoolError::RequesterNotFound)
    }

    /// A registration-type transaction is rejected while the sender has any
    /// block-eligible transaction.
    pub(crate) fn check_unique_type(&self, transaction: &Transaction) -> PoolResult<()> {
        if transaction.tx_type.is_registration() &&
            self.storage.read().ready_has_sender(&transaction.sender_public_key)
        {
            return Err(PoolError::DuplicateTypeForSender)
        }
        Ok(())
    }

    /// Checks that the sender can cover `transaction` on top of all of its
    /// ready spend and returns the projected balance.
    pub(crate) async fn check_balance(&self, transaction: &Transaction) -> PoolResult<I256> {
        let address = transaction
            .sender_id
            .clone()
            .unwrap_or_else(|| self.accounts.generate_address(&transaction.sender_public_key));
        let on_chain =
            self.accounts.balance(&address).await.map_err(PoolError::SenderLookup)?;

        let projected = balance::projected_balance(&self.storage.read(), &address, on_chain);
        if projected < balance::signed(transaction.total_spend()) {
            return Err(PoolError::InsufficientFunds { address, projected })
        }
        Ok(projected)
    }

    /// Places a fully verified transaction: multisignature registrations,
    /// transactions collecting signatures and future-dated transactions go
    /// to pending, everything else becomes block-eligible immediately.
    pub(crate) fn route_verified(
        &self,
        transaction: Transaction,
        received_at: u64,
        broadcast: bool,
    ) -> TxStatus {
        let deferred = transaction.tx_type == TransactionType::Multi ||
            transaction.signatures.is_some() ||
            real_time_ms(transaction.timestamp) > received_at;

        let mut storage = self.storage.write();
        if deferred {
            storage.insert(TxStatus::Pending, StoredTransaction {
                transaction,
                received_at,
                broadcast,
            });
            TxStatus::Pending
        } else {
            if broadcast {
                storage.push_outbox(transaction.clone());
            }
            storage.insert(TxStatus::Ready, StoredTransaction {
                transaction,
                received_at,
                broadcast: false,
            });
            TxStatus::Ready
        }
    }

    pub(crate) fn mark_invalid(&self, id: &str) {
        self.storage.write().insert_invalid(id.to_owned());
    }

    /// Produces and appends a co-signature to a pending multisignature
    /// transaction.
    pub(crate) fn add_signature(&self, id: &str, secret: &str) -> PoolResult<()> {
        let transaction = self
            .storage
            .read()
            .get(TxStatus::Pending, id)
            .map(|stored| stored.transaction.clone())
            .ok_or(PoolError::NotInPool)?;

        let hash: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        let keypair = self.keys.make_keypair(&hash);

        let tagged_key = format!("+{}", keypair.public_key);
        if !transaction.keysgroup().iter().any(|key| *key == tagged_key) {
            return Err(PoolError::PermissionDenied)
        }

        let signature =
            self.logic.multisign(&keypair, &transaction).map_err(PoolError::Multisign)?;

        let mut storage = self.storage.write();
        let stored = storage.get_mut(TxStatus::Pending, id).ok_or(PoolError::NotInPool)?;
        let signatures = stored.transaction.signatures.get_or_insert_with(Vec::new);
        if signatures.contains(&signature) {
            return Err(PoolError::AlreadySigned)
        }
        signatures.push(signature);
        Ok(())
    }

    pub(crate) fn get(&self, id: &str) -> Option<(Transaction, TxStatus)> {
        self.storage
            .read()
            .lookup(id)
            .map(|(stored, status)| (stored.transaction.clone(), status))
    }

    pub(crate) fn get_all(&self, filter: &str, params: &GetAllParams) -> GetAllResponse {
        match filter {
            "unverified" => GetAllResponse::List(self.list_ordered(TxStatus::Unverified, params)),
            "pending" => GetAllResponse::List(self.list_ordered(TxStatus::Pending, params)),
            "ready" => GetAllResponse::List(self.list_ordered(TxStatus::Ready, params)),
            "sender_id" => {
                self.grouped(|transaction| {
                    params.id.is_some() && transaction.sender_id == params.id
                })
            }
            "sender_pk" => {
                self.grouped(|transaction| {
                    params.id.as_deref() == Some(transaction.sender_public_key.as_str())
                })
            }
            "recipient_id" => {
                self.grouped(|transaction| {
                    params.id.is_some() && transaction.recipient_id == params.id
                })
            }
            "recipient_pk" => {
                let address = params.id.as_ref().map(|key| self.accounts.generate_address(key));
                self.grouped(move |transaction| {
                    address.is_some() && transaction.recipient_id == address
                })
            }
            other => GetAllResponse::UnknownFilter(format!("Invalid filter: {other}")),
        }
    }

    fn list_ordered(&self, status: TxStatus, params: &GetAllParams) -> Vec<Transaction> {
        let storage = self.storage.read();
        let mut entries: Vec<&StoredTransaction> = storage.iter(status).collect();
        entries.sort_by(|a, b| {
            a.received_at
                .cmp(&b.received_at)
                .then_with(|| a.transaction.id.cmp(&b.transaction.id))
        });
        if params.reverse {
            entries.reverse();
        }
        entries
            .into_iter()
            .take(params.limit.unwrap_or(usize::MAX))
            .map(|stored| stored.transaction.clone())
            .collect()
    }

    fn grouped<F>(&self, matches: F) -> GetAllResponse
    where
        F: Fn(&Transaction) -> bool,
    {
        let storage = self.storage.read();
        let collect = |status: TxStatus| {
            storage
                .iter(status)
                .filter(|stored| matches(&stored.transaction))
                .map(|stored| stored.transaction.clone())
                .collect()
        };
        GetAllResponse::Grouped {
            unverified: collect(TxStatus::Unverified),
            pending:    collect(TxStatus::Pending),
            ready:      collect(TxStatus::Ready),
        }
    }

    /// The forger view: ready transactions ordered by fee (descending),
    /// admission time (ascending) and id (descending).
    pub(crate) fn get_ready(&self, limit: Option<usize>) -> Vec<Transaction> {
        let storage = self.storage.read();
        let mut entries: Vec<&StoredTransaction> = storage.iter(TxStatus::Ready).collect();
        entries.sort_by(|a, b| {
            b.transaction
                .fee
                .cmp(&a.transaction.fee)
                .then_with(|| a.received_at.cmp(&b.received_at))
                .then_with(|| b.transaction.id.cmp(&a.transaction.id))
        });
        entries
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|stored| stored.transaction.clone())
            .collect()
    }

    pub(crate) fn get_usage(&self) -> PoolUsage {
        let storage = self.storage.read();
        PoolUsage {
            unverified: storage.len(TxStatus::Unverified),
            pending:    storage.len(TxStatus::Pending),
            ready:      storage.len(TxStatus::Ready),
            invalid:    storage.invalid_len(),
            total:      storage.total(),
        }
    }

    /// Removes the id from every transaction list, returning the first list
    /// that held it.
    pub(crate) fn delete(&self, id: &str) -> Option<TxStatus> {
        let mut storage = self.storage.write();
        let mut hits = Vec::new();
        for status in TxStatus::ALL {
            if storage.remove(status, id).is_some() {
                hits.push(status);
            }
        }
        if hits.len() > 1 {
            debug!(target: "txpool", %id, lists = ?hits, "transaction occupied multiple lists");
        }
        hits.first().copied()
    }

    /// Unconditionally moves a batch into the ready list with a shared fresh
    /// admission time. Used when the block producer rolls transactions back
    /// from a failed block.
    pub(crate) fn add_ready(&self, transactions: Vec<Transaction>) {
        let received_at = wall_clock_ms();
        let mut storage = self.storage.write();
        for transaction in transactions {
            for status in TxStatus::ALL {
                storage.remove(status, &transaction.id);
            }
            storage.insert(TxStatus::Ready, StoredTransaction {
                transaction,
                received_at,
                broadcast: false,
            });
        }
    }

    /// Reconciles the pool after a block was applied: drops the confirmed
    /// transactions and evicts ready spend of senders that are no longer
    /// solvent.
    pub(crate) async fn sanitize_transactions(&self, transactions: Vec<Transaction>) {
        for transaction in transactions {
            self.delete(&transaction.id);

            let address = transaction
                .sender_id
                .clone()
                .unwrap_or_else(|| self.accounts.generate_address(&transaction.sender_public_key));
            let sender_has_ready = self
                .storage
                .read()
                .iter(TxStatus::Ready)
                .any(|stored| stored.transaction.sender_id.as_deref() == Some(address.as_str()));
            if !sender_has_ready {
                continue
            }

            let on_chain = match self.accounts.balance(&address).await {
                Ok(balance) => balance,
                Err(err) => {
                    warn!(target: "txpool", %address, %err, "balance lookup failed during sanitization");
                    continue
                }
            };
            let projected =
                balance::projected_balance(&self.storage.read(), &address, on_chain);
            if projected < I256::ZERO {
                self.credit_pop(&address, projected);
            }
        }
    }

    /// Evicts ready transactions of an underwater sender until its projected
    /// balance is non-negative.
    ///
    /// A single transaction whose spend cancels the deficit exactly is
    /// preferred; otherwise eviction starts from the largest spend, ties
    /// broken by the larger id.
    fn credit_pop(&self, address: &str, mut projected: I256) {
        let mut storage = self.storage.write();
        let mut spends: Vec<(TxId, I256)> = storage
            .iter(TxStatus::Ready)
            .filter(|stored| stored.transaction.sender_id.as_deref() == Some(address))
            .map(|stored| {
                (stored.transaction.id.clone(), balance::signed(stored.transaction.total_spend()))
            })
            .collect();

        if let Some((id, _)) = spends
            .iter()
            .filter(|(_, spend)| projected.saturating_add(*spend) == I256::ZERO)
            .max_by(|a, b| a.0.cmp(&b.0))
            .cloned()
        {
            storage.remove(TxStatus::Ready, &id);
            info!(target: "txpool", %address, %id, "evicted ready transaction to restore solvency");
            return
        }

        spends.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        while projected < I256::ZERO {
            let Some((id, spend)) = spends.pop() else { break };
            storage.remove(TxStatus::Ready, &id);
            projected = projected.saturating_add(spend);
            info!(target: "txpool", %address, %id, "evicted ready transaction to restore solvency");
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.storage.read().total()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
