//! Chain-wide constants and epoch time conversion.

/// Seconds in one hour, the unit of multisignature lifetimes.
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Base lifetime in seconds of an unconfirmed transaction in the pool.
pub const UNCONFIRMED_TRANSACTION_TIMEOUT: u64 = 10800;

/// Lifetime multiplier for transactions that are collecting signatures.
pub const SIGNATURE_TRANSACTION_TIMEOUT_MULTIPLIER: u64 = 4;

/// The chain epoch in unix milliseconds. Transaction timestamps count seconds
/// from this instant.
///
/// 2023-01-01T00:00:00Z
pub const EPOCH_TIME_MS: u64 = 1_672_531_200_000;

/// Converts a node-relative transaction timestamp into unix milliseconds.
pub fn real_time_ms(timestamp: i64) -> u64 {
    EPOCH_TIME_MS.saturating_add_signed(timestamp.saturating_mul(1000))
}

/// The current time expressed as a node-relative timestamp.
pub fn epoch_timestamp(now_ms: u64) -> i64 {
    (now_ms.saturating_sub(EPOCH_TIME_MS) / 1000) as i64
}
