//! Shared domain types for the galena node.
//!
//! Everything the mempool and its collaborators exchange lives here: the
//! transaction model, account snapshots returned by the account store, the
//! keypair handed out by the key-derivation primitive and the chain constants
//! that govern transaction lifetimes.

pub mod constants;
pub mod primitive;
pub mod transaction;

pub use primitive::{Account, Address, Keypair, PublicKeyHex, SignatureHex, TxId};
pub use transaction::{MultisigAsset, Transaction, TransactionAsset, TransactionType};
