//! Capability seams between the pool and the rest of the node.
//!
//! The pool never reaches for ambient globals: the account store, the
//! transaction logic, the key-derivation primitive and the message bus are
//! all constructor-supplied and consumed through the traits below.

use alloy_primitives::U256;
use galena_types::{Account, Address, Keypair, PublicKeyHex, SignatureHex, Transaction};

use crate::error::BoxError;

/// Bus topic carrying batches of transactions queued for outbound gossip.
///
/// The name is historical: it refers to the broadcast batch, not the
/// unverified pool list.
pub const BROADCAST_TOPIC: &str = "unverifiedTransaction";

/// Read-through access to on-chain account state.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Resolves the sender account for a public key.
    ///
    /// Stores are expected to synthesize an empty zero-balance account for
    /// keys that have never been seen on chain.
    async fn get_sender(&self, public_key: &PublicKeyHex) -> Result<Account, BoxError>;

    /// Looks up an existing account by public key.
    async fn get_account(&self, public_key: &PublicKeyHex) -> Result<Option<Account>, BoxError>;

    /// Returns the confirmed balance of an address. A missing account reads
    /// as zero.
    async fn balance(&self, address: &Address) -> Result<U256, BoxError>;

    /// Derives the address owned by a public key.
    fn generate_address(&self, public_key: &PublicKeyHex) -> Address;
}

/// The node's transaction codec and signature machinery.
#[async_trait::async_trait]
pub trait TransactionLogic: Send + Sync {
    /// Applies type-specific processing to a candidate transaction.
    async fn process(
        &self,
        transaction: &Transaction,
        sender: &Account,
        requester: Option<&Account>,
    ) -> Result<(), BoxError>;

    /// Cryptographically verifies a candidate transaction against its
    /// sender.
    async fn verify(&self, transaction: &Transaction, sender: &Account) -> Result<(), BoxError>;

    /// Produces an additional signature over a multisignature transaction.
    fn multisign(
        &self,
        keypair: &Keypair,
        transaction: &Transaction,
    ) -> Result<SignatureHex, BoxError>;
}

/// Key derivation primitive.
pub trait KeyDerivation: Send + Sync {
    /// Derives a signing keypair from a 32-byte seed hash.
    fn make_keypair(&self, hash: &[u8; 32]) -> Keypair;
}

/// The node-internal message bus used to hand off broadcast batches.
#[async_trait::async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes a message on the given topic.
    async fn message(&self, topic: &'static str, transactions: Vec<Transaction>);
}
