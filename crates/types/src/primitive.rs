//! Primitive identifiers and account-level types.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Unique transaction identifier.
pub type TxId = String;

/// On-chain account address.
pub type Address = String;

/// Hex-encoded public key.
pub type PublicKeyHex = String;

/// Hex-encoded signature.
pub type SignatureHex = String;

/// Snapshot of an account as returned by the account store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address:    Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKeyHex>,
    #[serde(default)]
    pub balance:    U256,
    /// Public keys of the co-signers registered for this account. Non-empty
    /// means the account is a multisignature account.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multisignatures: Vec<PublicKeyHex>,
}

impl Account {
    /// Whether the account requires multiple signatures to spend.
    pub fn is_multisig(&self) -> bool {
        !self.multisignatures.is_empty()
    }
}

/// A derived signing keypair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypair {
    pub public_key:  PublicKeyHex,
    pub private_key: SignatureHex,
}
