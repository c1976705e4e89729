//! Chainbook: multi-chain account synchronization and transaction
//! reconciliation.
//!
//! Tracks crypto-asset balances for addresses across three account-based
//! chains (Tron/TRC20, Ethereum/ERC20, BSC/BEP20) and keeps a historical
//! ledger of balance changes and the transactions that caused them.
//!
//! # Architecture
//!
//! - **Fetch layer**: retried HTTP executor shared by all readers
//! - **Chain readers**: Tron-style and EVM-style explorer adapters with
//!   API-key rotation and wire-format normalization
//! - **Reconciliation engine**: decides when history must be pulled and
//!   extracts the minimal transaction prefix explaining a balance delta
//! - **Ledger store**: idempotent, all-or-nothing persistence of accounts,
//!   statements and deduplicated transactions
//!
//! # Example
//!
//! ```ignore
//! use chainbook::{probe_chains, reconcile, LedgerStore, TrackerConfig};
//!
//! let config = TrackerConfig::from_env();
//! let store = LedgerStore::open(&config.ledger_dir);
//! let client = reqwest::Client::new();
//!
//! // Find which chains know this address
//! let resolved = probe_chains(&client, &config, address).await;
//!
//! // Sync one resolved account
//! for (chain, _balance) in resolved {
//!     let result = reconcile(&store, &client, &config, address, chain).await?;
//!     println!("{} new transactions", result.inserted_transactions);
//! }
//! ```

pub mod addressbook;
pub mod chain;
pub mod config;
pub mod error;
pub mod fetch;
pub mod readers;
pub mod reconcile;
pub mod storage;

// Re-export the caller-facing surface
pub use chain::ChainType;
pub use config::TrackerConfig;
pub use error::{StorageError, SyncError};
pub use readers::{AccountBalance, ChainReader, ChainTransaction};
pub use reconcile::{probe_chains, reconcile, SyncResult};
pub use storage::{Account, AccountStatement, AccountTransaction, LedgerStore, TxKind};
