//! Mock implementations of the pool's external collaborators.

mod accounts;
mod bus;
mod keys;
mod logic;

pub use accounts::{mock_address, MockAccountStore};
pub use bus::MockBus;
pub use keys::{keysgroup_entry, MockKeys};
pub use logic::{mock_signature, MockTransactionLogic};
