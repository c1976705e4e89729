//! Chain reference data
//!
//! The three supported account-based ledgers and their per-chain constants:
//! native token symbol, unit scales, tracked token contract and explorer
//! endpoint. Immutable at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TRON_API_URL: &str = "https://api.trongrid.io/v1";
pub const TRON_USDT_CONTRACT: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";

pub const ETHERSCAN_API_URL: &str = "https://api.etherscan.io/api";
pub const ETHERSCAN_USDT_CONTRACT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

pub const BSCSCAN_API_URL: &str = "https://api.bscscan.com/api";
pub const BSCSCAN_USDT_CONTRACT: &str = "0x55d398326f99059ff775485246999027b3197955";

/// Supported chain families. TRC20 uses the Tron-style explorer API;
/// ERC20 and BEP20 share the Etherscan-style API and differ only by
/// base URL and tracked token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainType {
    #[serde(rename = "TRC20")]
    Trc20,
    #[serde(rename = "ERC20")]
    Erc20,
    #[serde(rename = "BEP20")]
    Bep20,
}

impl ChainType {
    pub const ALL: [ChainType; 3] = [ChainType::Trc20, ChainType::Erc20, ChainType::Bep20];

    /// Symbol of the chain's base currency
    pub fn native_token(&self) -> &'static str {
        match self {
            ChainType::Trc20 => "TRX",
            ChainType::Erc20 => "ETH",
            ChainType::Bep20 => "BNB",
        }
    }

    /// Minor units per whole native token
    pub fn native_unit(&self) -> u128 {
        match self {
            ChainType::Trc20 => 1_000_000,
            ChainType::Erc20 => 1_000_000_000_000_000_000,
            ChainType::Bep20 => 1_000_000_000_000_000_000,
        }
    }

    /// Minor units per whole tracked token
    pub fn token_unit(&self) -> u128 {
        match self {
            ChainType::Trc20 => 1_000_000,
            ChainType::Erc20 => 1_000_000,
            ChainType::Bep20 => 1_000_000_000_000_000_000,
        }
    }

    /// Tracked stablecoin contract address on this chain
    pub fn token_contract(&self) -> &'static str {
        match self {
            ChainType::Trc20 => TRON_USDT_CONTRACT,
            ChainType::Erc20 => ETHERSCAN_USDT_CONTRACT,
            ChainType::Bep20 => BSCSCAN_USDT_CONTRACT,
        }
    }

    /// Default explorer API base URL
    pub fn default_api_url(&self) -> &'static str {
        match self {
            ChainType::Trc20 => TRON_API_URL,
            ChainType::Erc20 => ETHERSCAN_API_URL,
            ChainType::Bep20 => BSCSCAN_API_URL,
        }
    }

    /// Canonical stored form of an address on this chain.
    ///
    /// Tron addresses are case-sensitive base58 and kept as-is; EVM
    /// addresses are compared case-insensitively and stored lower-cased.
    pub fn canonical_address(&self, address: &str) -> String {
        match self {
            ChainType::Trc20 => address.to_string(),
            ChainType::Erc20 | ChainType::Bep20 => address.to_lowercase(),
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChainType::Trc20 => "TRC20",
            ChainType::Erc20 => "ERC20",
            ChainType::Bep20 => "BEP20",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ChainType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRC20" => Ok(ChainType::Trc20),
            "ERC20" => Ok(ChainType::Erc20),
            "BEP20" => Ok(ChainType::Bep20),
            other => Err(format!("Unknown chain type: {}", other)),
        }
    }
}
