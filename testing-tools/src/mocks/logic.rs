use std::{collections::HashSet, sync::Arc};

use alloy_primitives::hex;
use galena_types::{Account, Keypair, SignatureHex, Transaction, TxId};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use transaction_pool::{BoxError, TransactionLogic};

/// The signature [`MockTransactionLogic::multisign`] produces for a signer
/// over a transaction.
pub fn mock_signature(public_key: &str, id: &str) -> SignatureHex {
    hex::encode(Sha256::digest(format!("{public_key}:{id}").as_bytes()))
}

/// Transaction logic that accepts everything unless told otherwise.
#[derive(Debug, Default, Clone)]
pub struct MockTransactionLogic {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    fail_process: HashSet<TxId>,
    fail_verify:  HashSet<TxId>,
}

impl MockTransactionLogic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `process` reject the given id.
    pub fn fail_process(&self, id: &str) {
        self.inner.write().fail_process.insert(id.into());
    }

    /// Makes `verify` reject the given id.
    pub fn fail_verify(&self, id: &str) {
        self.inner.write().fail_verify.insert(id.into());
    }

    /// Lets the given id pass both stages again.
    pub fn pass(&self, id: &str) {
        let mut inner = self.inner.write();
        inner.fail_process.remove(id);
        inner.fail_verify.remove(id);
    }
}

#[async_trait::async_trait]
impl TransactionLogic for MockTransactionLogic {
    async fn process(
        &self,
        transaction: &Transaction,
        _sender: &Account,
        _requester: Option<&Account>,
    ) -> Result<(), BoxError> {
        if self.inner.read().fail_process.contains(&transaction.id) {
            return Err(eyre::eyre!("cannot process transaction {}", transaction.id).into())
        }
        Ok(())
    }

    async fn verify(&self, transaction: &Transaction, _sender: &Account) -> Result<(), BoxError> {
        if self.inner.read().fail_verify.contains(&transaction.id) {
            return Err(eyre::eyre!("invalid signature on {}", transaction.id).into())
        }
        Ok(())
    }

    fn multisign(
        &self,
        keypair: &Keypair,
        transaction: &Transaction,
    ) -> Result<SignatureHex, BoxError> {
        Ok(mock_signature(&keypair.public_key, &transaction.id))
    }
}
