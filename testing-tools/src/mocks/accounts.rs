use std::{collections::HashMap, sync::Arc};

use alloy_primitives::U256;
use galena_types::{Account, Address, PublicKeyHex};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use transaction_pool::{AccountStore, BoxError};

/// Deterministic address derivation used by the mock store.
pub fn mock_address(public_key: &str) -> Address {
    let digest = Sha256::digest(public_key.as_bytes());
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    format!("{}G", u64::from_be_bytes(word))
}

/// An in-memory account store.
///
/// Unknown sender keys resolve to a synthesized zero-balance account, the
/// way a real store materialises first-seen senders.
#[derive(Debug, Default, Clone)]
pub struct MockAccountStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<PublicKeyHex, Account>,
    balances: HashMap<Address, U256>,
    offline:  bool,
}

impl MockAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account, indexing it by public key and address.
    pub fn add_account(&self, account: Account) {
        let mut inner = self.inner.write();
        inner.balances.insert(account.address.clone(), account.balance);
        if let Some(public_key) = account.public_key.clone() {
            inner.accounts.insert(public_key, account);
        }
    }

    /// Registers a plain funded account for `public_key` and returns its
    /// address.
    pub fn fund(&self, public_key: &str, balance: u64) -> Address {
        let address = mock_address(public_key);
        self.add_account(Account {
            address: address.clone(),
            public_key: Some(public_key.into()),
            balance: U256::from(balance),
            multisignatures: Vec::new(),
        });
        address
    }

    /// Overwrites the confirmed balance of an address.
    pub fn set_balance(&self, address: &str, balance: U256) {
        self.inner.write().balances.insert(address.into(), balance);
    }

    /// Makes every lookup fail, simulating a store outage.
    pub fn set_offline(&self, offline: bool) {
        self.inner.write().offline = offline;
    }
}

#[async_trait::async_trait]
impl AccountStore for MockAccountStore {
    async fn get_sender(&self, public_key: &PublicKeyHex) -> Result<Account, BoxError> {
        let inner = self.inner.read();
        if inner.offline {
            return Err(eyre::eyre!("account store offline").into())
        }
        Ok(inner.accounts.get(public_key).cloned().unwrap_or_else(|| Account {
            address: mock_address(public_key),
            public_key: Some(public_key.clone()),
            ..Default::default()
        }))
    }

    async fn get_account(&self, public_key: &PublicKeyHex) -> Result<Option<Account>, BoxError> {
        let inner = self.inner.read();
        if inner.offline {
            return Err(eyre::eyre!("account store offline").into())
        }
        Ok(inner.accounts.get(public_key).cloned())
    }

    async fn balance(&self, address: &Address) -> Result<U256, BoxError> {
        let inner = self.inner.read();
        if inner.offline {
            return Err(eyre::eyre!("account store offline").into())
        }
        Ok(inner.balances.get(address).copied().unwrap_or_default())
    }

    fn generate_address(&self, public_key: &PublicKeyHex) -> Address {
        mock_address(public_key)
    }
}
