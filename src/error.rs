use thiserror::Error;

use crate::chain::ChainType;

#[derive(Error, Debug)]
pub enum SyncError {
    /// All fetch attempts against the explorer API were exhausted.
    /// Terminal for this account; retries already happened in the fetch layer.
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// The provider explicitly reported the address does not exist on this
    /// chain. A valid outcome when probing one address across chains.
    #[error("Account not found on {chain}: {address}")]
    AccountNotFound { address: String, chain: ChainType },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Integrity violation while applying a sync batch; nothing is committed.
    #[error("Persistence conflict: {0}")]
    Conflict(String),
}
