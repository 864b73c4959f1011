use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::U256;
use galena_types::{
    constants::epoch_timestamp, MultisigAsset, Transaction, TransactionAsset, TransactionType,
};
use rand::Rng;

use crate::mocks::keysgroup_entry;

/// The current time as a node-relative timestamp.
pub fn now_timestamp() -> i64 {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default();
    epoch_timestamp(now_ms)
}

/// A plain transfer dated now.
pub fn transfer(
    id: &str,
    sender_public_key: &str,
    recipient_id: &str,
    amount: u64,
    fee: u64,
) -> Transaction {
    Transaction {
        id: id.into(),
        tx_type: TransactionType::Send,
        sender_public_key: sender_public_key.into(),
        sender_id: None,
        requester_public_key: None,
        recipient_id: Some(recipient_id.into()),
        amount: U256::from(amount),
        fee: U256::from(fee),
        timestamp: now_timestamp(),
        signatures: None,
        asset: None,
    }
}

/// A transfer dated `secs_ahead` into the future.
pub fn future_transfer(
    id: &str,
    sender_public_key: &str,
    recipient_id: &str,
    amount: u64,
    fee: u64,
    secs_ahead: i64,
) -> Transaction {
    let mut tx = transfer(id, sender_public_key, recipient_id, amount, fee);
    tx.timestamp += secs_ahead;
    tx
}

/// A transfer with a random id.
pub fn random_transfer(
    sender_public_key: &str,
    recipient_id: &str,
    amount: u64,
    fee: u64,
) -> Transaction {
    let id = rand::thread_rng().gen::<u64>().to_string();
    transfer(&id, sender_public_key, recipient_id, amount, fee)
}

/// A registration transaction (second signature, delegate or vote).
pub fn registration(
    id: &str,
    sender_public_key: &str,
    tx_type: TransactionType,
    fee: u64,
) -> Transaction {
    let mut tx = transfer(id, sender_public_key, "", 0, fee);
    tx.recipient_id = None;
    tx.tx_type = tx_type;
    tx
}

/// A multisignature-group registration whose co-signers are the keys derived
/// from `secrets`, with an empty signature list.
pub fn multisig_registration(
    id: &str,
    sender_public_key: &str,
    min: u32,
    lifetime: u64,
    secrets: &[&str],
    fee: u64,
) -> Transaction {
    let mut tx = registration(id, sender_public_key, TransactionType::Multi, fee);
    tx.signatures = Some(Vec::new());
    tx.asset = Some(TransactionAsset {
        multisignature: Some(MultisigAsset {
            min,
            lifetime,
            keysgroup: secrets.iter().map(|secret| keysgroup_entry(secret)).collect(),
        }),
    });
    tx
}
