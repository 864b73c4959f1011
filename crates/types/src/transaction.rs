//! The transaction model shared between the mempool and the node's
//! transaction logic.
//!
//! The pool treats transactions as largely opaque: it only inspects the
//! fields modelled here (identity, type tag, sender/recipient, monetary
//! amounts, timestamp and the multisignature asset).

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::primitive::{Address, PublicKeyHex, SignatureHex, TxId};

/// Transaction type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    /// Plain balance transfer.
    Send,
    /// Second-signature registration.
    Signature,
    /// Delegate registration.
    Delegate,
    /// Vote cast.
    Vote,
    /// Multisignature-group registration.
    Multi,
}

impl TransactionType {
    /// Registration types may appear at most once per sender among the
    /// block-eligible transactions.
    pub fn is_registration(&self) -> bool {
        matches!(self, Self::Signature | Self::Delegate | Self::Multi)
    }
}

/// The multisignature registration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigAsset {
    /// Number of signatures required before the transaction is
    /// block-eligible.
    pub min:       u32,
    /// Lifetime of the pending registration, in hours.
    pub lifetime:  u64,
    /// Allowed co-signers, encoded as `"+<hex-pubkey>"`.
    pub keysgroup: Vec<String>,
}

/// Type-specific transaction payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAsset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multisignature: Option<MultisigAsset>,
}

/// A candidate transaction as received from a client or peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TxId,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub sender_public_key: PublicKeyHex,
    /// Sender address. Derived from the sender account when absent on
    /// admission to a pool list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<Address>,
    /// Only meaningful when the sender is a multisignature account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_public_key: Option<PublicKeyHex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<Address>,
    #[serde(default)]
    pub amount: U256,
    pub fee: U256,
    /// Node-relative seconds since the chain epoch.
    pub timestamp: i64,
    /// Present once multi-party signing is underway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<SignatureHex>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<TransactionAsset>,
}

impl Transaction {
    /// The total balance this transaction spends, `amount + fee`.
    pub fn total_spend(&self) -> U256 {
        self.amount.saturating_add(self.fee)
    }

    /// The multisignature payload, if this is a `Multi` registration.
    pub fn multisignature(&self) -> Option<&MultisigAsset> {
        self.asset.as_ref()?.multisignature.as_ref()
    }

    /// Allowed co-signers for this transaction.
    pub fn keysgroup(&self) -> &[String] {
        self.multisignature().map(|m| m.keysgroup.as_slice()).unwrap_or_default()
    }

    /// Number of collected signatures.
    pub fn signature_count(&self) -> usize {
        self.signatures.as_ref().map(Vec::len).unwrap_or_default()
    }
}
