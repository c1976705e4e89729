//! Persisted ledger data shapes
//!
//! Balances are minor-unit integers; the engine never does decimal
//! arithmetic on them. Display conversion is the caller's job via the
//! `ChainType` unit scales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::ChainType;

/// An on-chain account tracked by the ledger, keyed by (address, chain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub chain_type: ChainType,
    pub native_balance: u128,
    pub token_balance: u128,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        address: impl Into<String>,
        chain_type: ChainType,
        native_balance: u128,
        token_balance: u128,
    ) -> Self {
        let now = Utc::now();
        Self {
            address: address.into(),
            chain_type,
            native_balance,
            token_balance,
            created_at: now,
            updated_at: now,
        }
    }

    /// A zero-balance placeholder row, used to materialize transaction
    /// counterparties that have never been synced themselves.
    pub fn bare(address: impl Into<String>, chain_type: ChainType) -> Self {
        Self::new(address, chain_type, 0, 0)
    }

    /// Stored balance of one transaction kind
    pub fn balance_of(&self, kind: TxKind) -> u128 {
        match kind {
            TxKind::Native => self.native_balance,
            TxKind::Token => self.token_balance,
        }
    }

    pub fn short_address(&self) -> String {
        if self.address.len() <= 6 {
            return self.address.clone();
        }
        format!(
            "{}...{}",
            &self.address[..3],
            &self.address[self.address.len() - 3..]
        )
    }
}

/// Which ledger a transaction moved value on: the chain's base currency
/// or the tracked token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Native,
    Token,
}

impl TxKind {
    pub const ALL: [TxKind; 2] = [TxKind::Native, TxKind::Token];
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxKind::Native => write!(f, "native"),
            TxKind::Token => write!(f, "token"),
        }
    }
}

/// Timestamped snapshot of an account's balances. The most recent statement
/// per account is the reconciliation baseline and is updated in place on
/// re-sync rather than appended unboundedly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatement {
    pub account_address: String,
    pub chain_type: ChainType,
    pub timestamp: DateTime<Utc>,
    pub native_balance: u128,
    pub token_balance: u128,
}

/// A directed ledger edge. Direction is encoded by from/to; `amount` is the
/// absolute value transferred, never signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTransaction {
    pub kind: TxKind,
    pub from_address: String,
    pub from_chain_type: ChainType,
    pub to_address: String,
    pub to_chain_type: ChainType,
    pub timestamp: DateTime<Utc>,
    pub amount: u128,
}

impl AccountTransaction {
    /// Natural key used for deduplicating inserts
    pub fn natural_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.kind,
            self.from_address,
            self.to_address,
            self.timestamp.timestamp_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_short_address() {
        let account = Account::bare("TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t", ChainType::Trc20);
        assert_eq!(account.short_address(), "TR7...j6t");
        let tiny = Account::bare("abc", ChainType::Erc20);
        assert_eq!(tiny.short_address(), "abc");
    }

    #[test]
    fn test_natural_key_distinguishes_kind_and_direction() {
        let ts = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();
        let tx = AccountTransaction {
            kind: TxKind::Native,
            from_address: "a".into(),
            from_chain_type: ChainType::Erc20,
            to_address: "b".into(),
            to_chain_type: ChainType::Erc20,
            timestamp: ts,
            amount: 5,
        };
        let mut token_tx = tx.clone();
        token_tx.kind = TxKind::Token;
        let mut reversed = tx.clone();
        reversed.from_address = "b".into();
        reversed.to_address = "a".into();

        assert_ne!(tx.natural_key(), token_tx.natural_key());
        assert_ne!(tx.natural_key(), reversed.natural_key());
        // amount is not part of the key
        let mut other_amount = tx.clone();
        other_amount.amount = 9;
        assert_eq!(tx.natural_key(), other_amount.natural_key());
    }
}
