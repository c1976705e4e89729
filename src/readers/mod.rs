//! Chain readers
//!
//! One adapter per explorer API family: Tron-style (single-call balance,
//! path-routed endpoints) and EVM-style (Etherscan query protocol, shared by
//! Ethereum and BSC). A reader is an immutable per-request value: the API key
//! and client identification header are rolled at construction, so probing a
//! new address means building a new reader rather than mutating a live one.

mod evm;
mod tron;

pub use evm::EvmReader;
pub use tron::{hex_to_base58, TronReader};

use chrono::{DateTime, TimeZone, Utc};
use rand::seq::SliceRandom;

use crate::chain::ChainType;
use crate::error::SyncError;

/// Freshly fetched balances for one address on one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub address: String,
    pub native_balance: u128,
    pub token_balance: u128,
}

/// One normalized transaction from a provider page, most-recent-first order.
/// Addresses are already in the chain's canonical stored form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransaction {
    pub from_address: String,
    pub to_address: String,
    /// Absolute transferred amount in minor units; zero-value transfers are
    /// filtered out by the readers.
    pub amount: u128,
    pub timestamp: DateTime<Utc>,
}

impl ChainTransaction {
    /// Signed amount from the point of view of `own_address`: negative when
    /// the account sent the transfer, positive when it received it.
    pub fn signed_amount(&self, own_address: &str) -> i128 {
        if self.from_address == own_address {
            -(self.amount as i128)
        } else {
            self.amount as i128
        }
    }
}

const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
];

/// Random client identification header, re-rolled per reader
pub(crate) fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Random key from the pool, empty when no keys are configured
pub(crate) fn pick_api_key(api_keys: &[String]) -> String {
    api_keys
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default()
}

pub(crate) fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

pub(crate) fn timestamp_from_secs(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Polymorphic reader over the capability set
/// {get_balance, get_native_transactions, get_token_transactions}.
pub enum ChainReader {
    Tron(TronReader),
    Evm(EvmReader),
}

impl ChainReader {
    /// Build a reader for `address` on `chain`, selecting one API key at
    /// random from the pool.
    pub fn new(chain: ChainType, address: &str, api_keys: &[String], base_url: &str) -> Self {
        match chain {
            ChainType::Trc20 => ChainReader::Tron(TronReader::new(address, api_keys, base_url)),
            ChainType::Erc20 | ChainType::Bep20 => {
                ChainReader::Evm(EvmReader::new(chain, address, api_keys, base_url))
            }
        }
    }

    /// The canonically encoded address this reader queries
    pub fn address(&self) -> &str {
        match self {
            ChainReader::Tron(reader) => reader.address(),
            ChainReader::Evm(reader) => reader.address(),
        }
    }

    /// Current balances, or `None` when the provider reports the address is
    /// not present on this chain.
    pub async fn get_balance(
        &self,
        client: &reqwest::Client,
    ) -> Result<Option<AccountBalance>, SyncError> {
        match self {
            ChainReader::Tron(reader) => reader.get_balance(client).await,
            ChainReader::Evm(reader) => reader.get_balance(client).await,
        }
    }

    /// Most recent page of native-currency transactions. A provider
    /// non-success response yields an empty page, not an error.
    pub async fn get_native_transactions(
        &self,
        client: &reqwest::Client,
    ) -> Result<Vec<ChainTransaction>, SyncError> {
        match self {
            ChainReader::Tron(reader) => reader.get_native_transactions(client).await,
            ChainReader::Evm(reader) => reader.get_native_transactions(client).await,
        }
    }

    /// Most recent page of tracked-token transactions
    pub async fn get_token_transactions(
        &self,
        client: &reqwest::Client,
    ) -> Result<Vec<ChainTransaction>, SyncError> {
        match self {
            ChainReader::Tron(reader) => reader.get_token_transactions(client).await,
            ChainReader::Evm(reader) => reader.get_token_transactions(client).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_amount_direction() {
        let tx = ChainTransaction {
            from_address: "alice".into(),
            to_address: "bob".into(),
            amount: 70,
            timestamp: Utc::now(),
        };
        assert_eq!(tx.signed_amount("alice"), -70);
        assert_eq!(tx.signed_amount("bob"), 70);
    }

    #[test]
    fn test_pick_api_key_empty_pool() {
        assert_eq!(pick_api_key(&[]), "");
        let keys = vec!["k1".to_string(), "k2".to_string()];
        assert!(keys.contains(&pick_api_key(&keys)));
    }

    #[test]
    fn test_reader_variant_by_chain() {
        let keys = vec!["key".to_string()];
        let reader = ChainReader::new(ChainType::Trc20, "TAddr", &keys, "http://localhost/v1");
        assert!(matches!(reader, ChainReader::Tron(_)));
        let reader = ChainReader::new(ChainType::Bep20, "0xAB", &keys, "http://localhost/api");
        assert!(matches!(reader, ChainReader::Evm(_)));
        // EVM reader canonicalizes to lowercase
        assert_eq!(reader.address(), "0xab");
    }
}
