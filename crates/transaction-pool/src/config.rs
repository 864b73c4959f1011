use std::time::Duration;

/// Configuration options for the transaction pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of transactions held across the unverified, pending
    /// and ready lists. The invalid id cache does not count toward this.
    pub storage_limit:   usize,
    /// Interval between promotion ticks.
    pub process_interval: Duration,
    /// Interval between expiry sweeps and invalid-cache resets.
    pub expiry_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            storage_limit:    4000,
            process_interval: Duration::from_millis(30_000),
            expiry_interval:  Duration::from_millis(30_000),
        }
    }
}
