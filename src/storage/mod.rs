//! Storage and persistence layer
//!
//! - Ledger document persistence with atomic sync commits
//! - Persisted data models

mod ledger;
mod models;

pub use ledger::{CommitOutcome, LedgerStore, StatementOp, SyncBatch};
pub use models::{Account, AccountStatement, AccountTransaction, TxKind};
