//! Transaction pool errors.

use alloy_primitives::I256;
use galena_types::{Address, TxId};

/// Opaque error produced by an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Transaction pool result type.
pub type PoolResult<T> = Result<T, PoolError>;

/// All errors the pool can return to callers.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The id is cached in the invalid set.
    #[error("Transaction is already processed as invalid: {0}")]
    AlreadyInvalid(TxId),
    /// The id is already present in one of the pool lists.
    #[error("Transaction is already in pool: {0}")]
    DuplicateInPool(TxId),
    /// Admitting the transaction would exceed the configured storage limit.
    #[error("Transaction pool is full")]
    PoolFull,
    /// The account store failed to resolve the sender.
    #[error("Failed to fetch sender account")]
    SenderLookup(#[source] BoxError),
    /// The sender is a multisignature account and the named requester does
    /// not exist.
    #[error("Requester account not found")]
    RequesterNotFound,
    /// Transaction logic rejected the transaction during processing. The id
    /// is cached as invalid.
    #[error("Failed to process transaction")]
    Process(#[source] BoxError),
    /// Transaction logic rejected the transaction during verification. The
    /// id is cached as invalid.
    #[error("Failed to verify transaction")]
    Verify(#[source] BoxError),
    /// A registration-type transaction for this sender is already
    /// block-eligible.
    #[error("Transaction type already in pool for sender")]
    DuplicateTypeForSender,
    /// The sender cannot cover the transaction on top of its pending ready
    /// spend. Carries the projected balance for sanitization.
    #[error("Account {address} does not have enough funds: projected balance {projected}")]
    InsufficientFunds { address: Address, projected: I256 },
    /// Signing failed inside the transaction logic.
    #[error("Failed to produce multisignature")]
    Multisign(#[source] BoxError),
    /// The signing target is not in the pending list.
    #[error("Transaction is not in pool")]
    NotInPool,
    /// The signer's public key is not part of the transaction's keysgroup.
    #[error("Permission to sign transaction denied")]
    PermissionDenied,
    /// The produced signature was already appended.
    #[error("Transaction already signed")]
    AlreadySigned,
}
