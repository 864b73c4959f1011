//! Sender solvency over the pool.
//!
//! A sender's projected balance is its confirmed on-chain balance plus every
//! incoming ready transfer minus every outgoing ready spend. Only the ready
//! list participates: pending transactions are not yet committed to block
//! inclusion.

use alloy_primitives::{I256, U256};
use galena_types::TransactionType;

use crate::storage::{PoolStorage, TxStatus};

/// Widens an unsigned amount into the signed projection domain.
pub(crate) fn signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}

/// Projected balance of `address` given its confirmed balance.
pub(crate) fn projected_balance(storage: &PoolStorage, address: &str, on_chain: U256) -> I256 {
    let mut projected = signed(on_chain);
    for stored in storage.iter(TxStatus::Ready) {
        let transaction = &stored.transaction;
        if transaction.sender_id.as_deref() == Some(address) {
            projected = projected.saturating_sub(signed(transaction.total_spend()));
        }
        if transaction.tx_type == TransactionType::Send &&
            transaction.recipient_id.as_deref() == Some(address)
        {
            projected = projected.saturating_add(signed(transaction.amount));
        }
    }
    projected
}
