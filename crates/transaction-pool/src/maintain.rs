//! Background maintenance of the pool: the promotion loop, the expiry sweep
//! and the invalid-cache reset, plus their job registrations.

use galena_types::{
    constants::{
        real_time_ms, SECONDS_PER_HOUR, SIGNATURE_TRANSACTION_TIMEOUT_MULTIPLIER,
        UNCONFIRMED_TRANSACTION_TIMEOUT,
    },
    Transaction, TransactionType, TxId,
};
use tracing::{debug, info};

use crate::{
    error::{PoolError, PoolResult},
    jobs::JobsQueue,
    pool::PoolInner,
    storage::{wall_clock_ms, StoredTransaction, TxStatus},
    traits::{AccountStore, KeyDerivation, MessageBus, TransactionLogic, BROADCAST_TOPIC},
    Mempool,
};

/// Job name of the promotion loop.
pub const PROCESS_JOB: &str = "transactionPoolNextProcess";
/// Job name of the expiry sweep.
pub const EXPIRY_JOB: &str = "transactionPoolNextExpiryTransactions";
/// Job name of the invalid-cache reset.
pub const INVALID_RESET_JOB: &str = "transactionPoolNextInvalidTransactionsReset";

impl<A, L, K, B> PoolInner<A, L, K, B>
where
    A: AccountStore,
    L: TransactionLogic,
    K: KeyDerivation,
    B: MessageBus,
{
    /// One promotion tick.
    ///
    /// Phase A drains the unverified list through deferred verification,
    /// Phase B promotes pending transactions that became block-eligible,
    /// then the accumulated broadcast batch is handed off to the bus.
    pub(crate) async fn process_pool(&self) {
        let unverified = self.storage.write().drain(TxStatus::Unverified);
        for stored in unverified {
            let id = stored.transaction.id.clone();
            if let Err(err) = self.promote_unverified(stored).await {
                debug!(target: "txpool", %id, %err, "discarding unverified transaction");
            }
        }

        let now = wall_clock_ms();
        let promotable: Vec<TxId> = {
            let storage = self.storage.read();
            storage
                .iter(TxStatus::Pending)
                .filter(|stored| ready_for_promotion(&stored.transaction, now))
                .map(|stored| stored.transaction.id.clone())
                .collect()
        };
        for id in promotable {
            let mut storage = self.storage.write();
            let Some(stored) = storage.remove(TxStatus::Pending, &id) else { continue };
            let StoredTransaction { transaction, received_at, broadcast } = stored;
            if broadcast {
                storage.push_outbox(transaction.clone());
            }
            storage.insert(TxStatus::Ready, StoredTransaction {
                transaction,
                received_at,
                broadcast: false,
            });
        }

        let batch = self.storage.write().drain_outbox();
        if !batch.is_empty() {
            self.bus.message(BROADCAST_TOPIC, batch).await;
        }
    }

    /// Runs the deferred verification stages for a drained peer transaction
    /// and places it on success.
    async fn promote_unverified(&self, stored: StoredTransaction) -> PoolResult<()> {
        let StoredTransaction { mut transaction, received_at, broadcast } = stored;

        let sender = self
            .accounts
            .get_sender(&transaction.sender_public_key)
            .await
            .map_err(PoolError::SenderLookup)?;

        if let Err(cause) = self.logic.verify(&transaction, &sender).await {
            self.mark_invalid(&transaction.id);
            return Err(PoolError::Verify(cause))
        }

        self.check_unique_type(&transaction)?;

        transaction.sender_id.get_or_insert_with(|| sender.address.clone());
        self.check_balance(&transaction).await?;

        self.route_verified(transaction, received_at, broadcast);
        Ok(())
    }

    /// Evicts transactions that outlived their per-type timeout.
    pub(crate) fn expire_transactions(&self) {
        let now = wall_clock_ms();
        let mut storage = self.storage.write();
        for status in TxStatus::ALL {
            let expired: Vec<TxId> = storage
                .iter(status)
                .filter(|stored| {
                    seconds_in_pool(stored, now) > lifetime_secs(&stored.transaction)
                })
                .map(|stored| stored.transaction.id.clone())
                .collect();
            for id in expired {
                storage.remove(status, &id);
                info!(target: "txpool", %id, list = %status, "expired transaction");
            }
        }
    }

    /// Empties the invalid id cache, giving previously rejected ids a second
    /// chance.
    pub(crate) fn reset_invalid_transactions(&self) {
        let cleared = self.storage.write().clear_invalid();
        if cleared > 0 {
            debug!(target: "txpool", cleared, "cleared invalid transaction cache");
        }
    }
}

impl<A, L, K, B> Mempool<A, L, K, B>
where
    A: AccountStore + 'static,
    L: TransactionLogic + 'static,
    K: KeyDerivation + 'static,
    B: MessageBus + 'static,
{
    /// Registers the promotion, expiry and invalid-reset jobs on the
    /// scheduler. Re-registration under the same names replaces the previous
    /// tickers.
    pub fn register_jobs(&self, jobs: &JobsQueue) {
        let pool = self.clone();
        jobs.register(PROCESS_JOB, self.config().process_interval, move || {
            let pool = pool.clone();
            async move { pool.process_pool().await }
        });

        let pool = self.clone();
        jobs.register(EXPIRY_JOB, self.config().expiry_interval, move || {
            let pool = pool.clone();
            async move { pool.expire_transactions() }
        });

        let pool = self.clone();
        jobs.register(INVALID_RESET_JOB, self.config().expiry_interval, move || {
            let pool = pool.clone();
            async move { pool.reset_invalid_transactions() }
        });
    }
}

/// Whether a pending transaction became block-eligible.
///
/// Multisignature registrations promote once enough signatures arrived;
/// future-dated transactions promote once their timestamp passed, unless
/// they are still collecting signatures.
fn ready_for_promotion(transaction: &Transaction, now_ms: u64) -> bool {
    match transaction.tx_type {
        TransactionType::Multi => transaction
            .multisignature()
            .is_some_and(|multisig| transaction.signature_count() >= multisig.min as usize),
        _ => transaction.signatures.is_none() && real_time_ms(transaction.timestamp) <= now_ms,
    }
}

/// Pool lifetime of a transaction in seconds.
fn lifetime_secs(transaction: &Transaction) -> u64 {
    if let Some(multisig) = transaction.multisignature() {
        return multisig.lifetime.saturating_mul(SECONDS_PER_HOUR)
    }
    if transaction.signatures.is_some() {
        return UNCONFIRMED_TRANSACTION_TIMEOUT * SIGNATURE_TRANSACTION_TIMEOUT_MULTIPLIER
    }
    UNCONFIRMED_TRANSACTION_TIMEOUT
}

fn seconds_in_pool(stored: &StoredTransaction, now_ms: u64) -> u64 {
    now_ms.saturating_sub(stored.received_at) / 1000
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;
    use galena_types::{
        Account, Address, Keypair, MultisigAsset, PublicKeyHex, SignatureHex, TransactionAsset,
    };

    use super::*;
    use crate::{config::PoolConfig, error::BoxError, pool::PoolInner};

    struct NoopAccounts;

    #[async_trait::async_trait]
    impl AccountStore for NoopAccounts {
        async fn get_sender(&self, public_key: &PublicKeyHex) -> Result<Account, BoxError> {
            Ok(Account { address: self.generate_address(public_key), ..Default::default() })
        }

        async fn get_account(&self, _: &PublicKeyHex) -> Result<Option<Account>, BoxError> {
            Ok(None)
        }

        async fn balance(&self, _: &Address) -> Result<U256, BoxError> {
            Ok(U256::ZERO)
        }

        fn generate_address(&self, public_key: &PublicKeyHex) -> Address {
            format!("{public_key}-addr")
        }
    }

    struct NoopLogic;

    #[async_trait::async_trait]
    impl TransactionLogic for NoopLogic {
        async fn process(
            &self,
            _: &Transaction,
            _: &Account,
            _: Option<&Account>,
        ) -> Result<(), BoxError> {
            Ok(())
        }

        async fn verify(&self, _: &Transaction, _: &Account) -> Result<(), BoxError> {
            Ok(())
        }

        fn multisign(&self, _: &Keypair, _: &Transaction) -> Result<SignatureHex, BoxError> {
            Ok("00".into())
        }
    }

    struct NoopKeys;

    impl KeyDerivation for NoopKeys {
        fn make_keypair(&self, hash: &[u8; 32]) -> Keypair {
            let key = format!("{:02x}", hash[0]);
            Keypair { public_key: key.clone(), private_key: key }
        }
    }

    struct NoopBus;

    #[async_trait::async_trait]
    impl MessageBus for NoopBus {
        async fn message(&self, _: &'static str, _: Vec<Transaction>) {}
    }

    fn transaction(tx_type: TransactionType) -> Transaction {
        Transaction {
            id: "1".into(),
            tx_type,
            sender_public_key: "aa".into(),
            sender_id: Some("1G".into()),
            requester_public_key: None,
            recipient_id: None,
            amount: Default::default(),
            fee: Default::default(),
            timestamp: 0,
            signatures: None,
            asset: None,
        }
    }

    fn multi(min: u32, lifetime: u64, signatures: usize) -> Transaction {
        let mut tx = transaction(TransactionType::Multi);
        tx.signatures = Some((0..signatures).map(|i| format!("sig-{i}")).collect());
        tx.asset = Some(TransactionAsset {
            multisignature: Some(MultisigAsset { min, lifetime, keysgroup: Vec::new() }),
        });
        tx
    }

    #[test]
    fn multisig_promotes_at_threshold() {
        assert!(!ready_for_promotion(&multi(2, 24, 1), u64::MAX));
        assert!(ready_for_promotion(&multi(2, 24, 2), 0));
        assert!(ready_for_promotion(&multi(2, 24, 3), 0));
    }

    #[test]
    fn future_dated_promotes_once_matured() {
        let mut tx = transaction(TransactionType::Send);
        tx.timestamp = 1_000;
        assert!(!ready_for_promotion(&tx, real_time_ms(999)));
        assert!(ready_for_promotion(&tx, real_time_ms(1_000)));
    }

    #[test]
    fn signature_collecting_transactions_stay_pending() {
        let mut tx = transaction(TransactionType::Send);
        tx.signatures = Some(vec!["sig".into()]);
        assert!(!ready_for_promotion(&tx, u64::MAX));
    }

    fn pool_inner() -> PoolInner<NoopAccounts, NoopLogic, NoopKeys, NoopBus> {
        PoolInner::new(PoolConfig::default(), NoopAccounts, NoopLogic, NoopKeys, NoopBus)
    }

    fn stored_at(transaction: Transaction, age_secs: u64) -> StoredTransaction {
        StoredTransaction {
            transaction,
            received_at: wall_clock_ms().saturating_sub(age_secs * 1000),
            broadcast: false,
        }
    }

    fn with_id(mut tx: Transaction, id: &str) -> Transaction {
        tx.id = id.into();
        tx
    }

    #[test]
    fn expiry_applies_per_type_timeouts() {
        let pool = pool_inner();
        {
            let mut storage = pool.storage.write();
            storage.insert(
                TxStatus::Ready,
                stored_at(
                    with_id(transaction(TransactionType::Send), "fresh"),
                    UNCONFIRMED_TRANSACTION_TIMEOUT - 60,
                ),
            );
            storage.insert(
                TxStatus::Ready,
                stored_at(
                    with_id(transaction(TransactionType::Send), "stale"),
                    UNCONFIRMED_TRANSACTION_TIMEOUT + 60,
                ),
            );
            // a 48h registration outlives the base timeout
            storage.insert(
                TxStatus::Pending,
                stored_at(with_id(multi(2, 48, 0), "multi-fresh"), UNCONFIRMED_TRANSACTION_TIMEOUT),
            );
            storage.insert(
                TxStatus::Pending,
                stored_at(with_id(multi(2, 1, 0), "multi-stale"), 2 * SECONDS_PER_HOUR),
            );
            // collecting signatures stretches the base timeout
            let signing = {
                let mut tx = with_id(transaction(TransactionType::Send), "signing");
                tx.signatures = Some(Vec::new());
                tx
            };
            storage
                .insert(TxStatus::Unverified, stored_at(signing, UNCONFIRMED_TRANSACTION_TIMEOUT * 2));
        }

        pool.expire_transactions();

        let storage = pool.storage.read();
        assert!(storage.lookup("fresh").is_some());
        assert!(storage.lookup("stale").is_none());
        assert!(storage.lookup("multi-fresh").is_some());
        assert!(storage.lookup("multi-stale").is_none());
        assert!(storage.lookup("signing").is_some());
    }

    #[test]
    fn lifetimes_follow_transaction_shape() {
        assert_eq!(lifetime_secs(&multi(2, 24, 0)), 24 * SECONDS_PER_HOUR);

        let mut signing = transaction(TransactionType::Send);
        signing.signatures = Some(Vec::new());
        assert_eq!(
            lifetime_secs(&signing),
            UNCONFIRMED_TRANSACTION_TIMEOUT * SIGNATURE_TRANSACTION_TIMEOUT_MULTIPLIER
        );

        assert_eq!(
            lifetime_secs(&transaction(TransactionType::Send)),
            UNCONFIRMED_TRANSACTION_TIMEOUT
        );
    }
}
