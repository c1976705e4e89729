/// Tracker configuration from environment variables
///
/// Holds the per-chain explorer API key pools and base URL overrides,
/// plus the ledger storage directory.
use std::env;

use crate::chain::ChainType;

#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Tron explorer API keys (rotated at random per reader)
    pub tron_api_keys: Vec<String>,
    /// Etherscan API keys
    pub etherscan_api_keys: Vec<String>,
    /// BscScan API keys
    pub bscscan_api_keys: Vec<String>,
    /// Tron explorer base URL
    pub tron_api_url: String,
    /// Etherscan base URL
    pub etherscan_api_url: String,
    /// BscScan base URL
    pub bscscan_api_url: String,
    /// Directory holding the persisted ledger
    pub ledger_dir: String,
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl TrackerConfig {
    /// Load configuration from environment variables
    ///
    /// - `TRON_API_KEYS`, `ETHERSCAN_API_KEYS`, `BSCSCAN_API_KEYS`:
    ///   comma-separated key pools
    /// - `TRON_API_URL`, `ETHERSCAN_API_URL`, `BSCSCAN_API_URL`:
    ///   explorer base URL overrides (defaults to public endpoints)
    /// - `LEDGER_DIR`: ledger storage directory (default "./ledger")
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let tron_api_keys = split_keys(&env::var("TRON_API_KEYS").unwrap_or_default());
        let etherscan_api_keys = split_keys(&env::var("ETHERSCAN_API_KEYS").unwrap_or_default());
        let bscscan_api_keys = split_keys(&env::var("BSCSCAN_API_KEYS").unwrap_or_default());

        let tron_api_url = env::var("TRON_API_URL")
            .unwrap_or_else(|_| ChainType::Trc20.default_api_url().to_string());
        let etherscan_api_url = env::var("ETHERSCAN_API_URL")
            .unwrap_or_else(|_| ChainType::Erc20.default_api_url().to_string());
        let bscscan_api_url = env::var("BSCSCAN_API_URL")
            .unwrap_or_else(|_| ChainType::Bep20.default_api_url().to_string());

        let ledger_dir = env::var("LEDGER_DIR").unwrap_or_else(|_| "./ledger".to_string());

        log::info!(
            "Tracker config: tron={} ({} keys), etherscan={} ({} keys), bscscan={} ({} keys)",
            tron_api_url,
            tron_api_keys.len(),
            etherscan_api_url,
            etherscan_api_keys.len(),
            bscscan_api_url,
            bscscan_api_keys.len()
        );

        Self {
            tron_api_keys,
            etherscan_api_keys,
            bscscan_api_keys,
            tron_api_url,
            etherscan_api_url,
            bscscan_api_url,
            ledger_dir,
        }
    }

    /// API key pool for one chain
    pub fn api_keys(&self, chain: ChainType) -> &[String] {
        match chain {
            ChainType::Trc20 => &self.tron_api_keys,
            ChainType::Erc20 => &self.etherscan_api_keys,
            ChainType::Bep20 => &self.bscscan_api_keys,
        }
    }

    /// Explorer base URL for one chain
    pub fn api_url(&self, chain: ChainType) -> &str {
        match chain {
            ChainType::Trc20 => &self.tron_api_url,
            ChainType::Erc20 => &self.etherscan_api_url,
            ChainType::Bep20 => &self.bscscan_api_url,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tron_api_keys: Vec::new(),
            etherscan_api_keys: Vec::new(),
            bscscan_api_keys: Vec::new(),
            tron_api_url: ChainType::Trc20.default_api_url().to_string(),
            etherscan_api_url: ChainType::Erc20.default_api_url().to_string(),
            bscscan_api_url: ChainType::Bep20.default_api_url().to_string(),
            ledger_dir: "./ledger".to_string(),
        }
    }
}
