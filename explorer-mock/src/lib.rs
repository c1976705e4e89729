/// Explorer Mock Server Library
///
/// Mocks the two explorer API families consumed by chainbook (Tron-style
/// path-routed endpoints and Etherscan-style query endpoints) against an
/// in-memory fixture ledger. Usable as a standalone binary or spawned
/// in-process by integration tests.
pub mod handlers;
pub mod server;
pub mod state;

// Re-export commonly used types
pub use server::{create_router, run_server, spawn_ephemeral};
pub use state::{MockAccount, MockLedger, MockTx};
