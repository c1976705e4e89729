/// In-memory fixture ledger backing the mock explorer
///
/// Both API families read from the same account map, so one server instance
/// can stand in for a Tron explorer and an Etherscan-style explorer at once.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

fn default_true() -> bool {
    true
}

/// One fixture transaction, most-recent-first within its list.
/// Addresses are emitted verbatim: Tron native fixtures supply 41-prefixed
/// hex (as the real API does), everything else supplies display form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockTx {
    pub from: String,
    pub to: String,
    /// Transfer amount in minor units, as a decimal string
    pub value: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockAccount {
    pub address: String,
    #[serde(default)]
    pub native_balance: String,
    #[serde(default)]
    pub token_balance: String,
    /// Key under which the token balance appears in Tron trc20 payloads
    #[serde(default)]
    pub token_contract: String,
    #[serde(default)]
    pub native_txs: Vec<MockTx>,
    #[serde(default)]
    pub token_txs: Vec<MockTx>,
    /// When false the account answers as unknown on every endpoint
    #[serde(default = "default_true")]
    pub exists: bool,
    /// Simulate a rate-limited token-balance sub-call while the native
    /// balance call still succeeds
    #[serde(default)]
    pub token_call_fails: bool,
}

impl MockAccount {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            native_balance: "0".to_string(),
            token_balance: "0".to_string(),
            token_contract: String::new(),
            native_txs: Vec::new(),
            token_txs: Vec::new(),
            exists: true,
            token_call_fails: false,
        }
    }
}

#[derive(Default)]
pub struct MockLedger {
    accounts: RwLock<HashMap<String, MockAccount>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_account(&self, account: MockAccount) {
        let mut accounts = self.accounts.write().expect("fixture lock poisoned");
        accounts.insert(account.address.clone(), account);
    }

    /// Case-insensitive lookup; EVM clients query lower-cased addresses
    pub fn get(&self, address: &str) -> Option<MockAccount> {
        let accounts = self.accounts.read().expect("fixture lock poisoned");
        if let Some(account) = accounts.get(address) {
            return Some(account.clone());
        }
        accounts
            .values()
            .find(|account| account.address.eq_ignore_ascii_case(address))
            .cloned()
    }

    pub fn reset(&self) {
        self.accounts.write().expect("fixture lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.accounts.read().expect("fixture lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
