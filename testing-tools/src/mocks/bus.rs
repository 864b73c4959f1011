use std::sync::Arc;

use galena_types::Transaction;
use parking_lot::RwLock;
use transaction_pool::MessageBus;

/// A message bus that records every published batch.
#[derive(Debug, Default, Clone)]
pub struct MockBus {
    messages: Arc<RwLock<Vec<(&'static str, Vec<Transaction>)>>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all recorded messages, leaving the bus empty.
    pub fn take(&self) -> Vec<(&'static str, Vec<Transaction>)> {
        std::mem::take(&mut *self.messages.write())
    }

    pub fn message_count(&self) -> usize {
        self.messages.read().len()
    }
}

#[async_trait::async_trait]
impl MessageBus for MockBus {
    async fn message(&self, topic: &'static str, transactions: Vec<Transaction>) {
        self.messages.write().push((topic, transactions));
    }
}
