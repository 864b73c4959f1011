//! Testing utilities for the galena workspace: mock collaborators for the
//! transaction pool and generators for well-formed transactions.

pub mod mocks;
pub mod type_generator;

/// Initialises a compact tracing subscriber for tests. Safe to call from
/// every test; only the first call installs the subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
