//! Reconciliation engine
//!
//! Compares a stored account snapshot against freshly fetched balances,
//! decides per transaction kind whether history must be pulled, extracts the
//! minimal transaction prefix explaining the observed delta, and commits
//! account, statement and transaction rows as one unit.

use chrono::Utc;
use std::collections::BTreeSet;

use crate::chain::ChainType;
use crate::config::TrackerConfig;
use crate::error::SyncError;
use crate::readers::{AccountBalance, ChainReader, ChainTransaction};
use crate::storage::{
    Account, AccountStatement, AccountTransaction, LedgerStore, StatementOp, SyncBatch, TxKind,
};

/// Outcome of one account sync
#[derive(Debug)]
pub struct SyncResult {
    pub account: Account,
    pub created_counterparties: usize,
    pub inserted_transactions: usize,
}

/// The ordered transactions explaining a balance delta. `exact` is false
/// when no prefix of the fetched page summed to the delta; the partial
/// subset is committed anyway and the gap closes on later syncs.
#[derive(Debug)]
pub struct ExplainingSubset {
    pub transactions: Vec<ChainTransaction>,
    pub exact: bool,
}

fn fetched_balance_of(balance: &AccountBalance, kind: TxKind) -> u128 {
    match kind {
        TxKind::Native => balance.native_balance,
        TxKind::Token => balance.token_balance,
    }
}

/// A kind needs history fetched when there is no stored account or the
/// stored balance of that kind differs from the fresh one. The two kinds
/// are evaluated independently.
pub fn needs_reconcile(stored: Option<&Account>, fetched: &AccountBalance, kind: TxKind) -> bool {
    match stored {
        None => true,
        Some(account) => account.balance_of(kind) != fetched_balance_of(fetched, kind),
    }
}

/// Walk the page in provider order (most recent first) accumulating the
/// signed sum, and stop as soon as `stored_balance + sum == fetched_balance`.
/// The comparison uses the balance of the kind being reconciled, so the
/// caller passes both values for the same kind.
pub fn explaining_subset(
    transactions: &[ChainTransaction],
    own_address: &str,
    stored_balance: u128,
    fetched_balance: u128,
) -> ExplainingSubset {
    let target = fetched_balance as i128;
    let mut running = stored_balance as i128;
    let mut subset = Vec::new();

    if running == target {
        return ExplainingSubset {
            transactions: subset,
            exact: true,
        };
    }

    for tx in transactions {
        running += tx.signed_amount(own_address);
        subset.push(tx.clone());
        if running == target {
            return ExplainingSubset {
                transactions: subset,
                exact: true,
            };
        }
    }

    // Provider returned too few transactions or a gap exists; commit what
    // we found and let a later sync bridge the rest.
    ExplainingSubset {
        transactions: subset,
        exact: false,
    }
}

/// Distinct counterparty addresses of the explaining subset, materialized as
/// bare accounts so every ledger edge has valid endpoints.
pub fn counterparty_accounts(
    subset: &[ChainTransaction],
    own_address: &str,
    chain_type: ChainType,
) -> Vec<Account> {
    let mut addresses = BTreeSet::new();
    for tx in subset {
        addresses.insert(tx.from_address.as_str());
        addresses.insert(tx.to_address.as_str());
    }
    addresses.remove(own_address);
    addresses
        .into_iter()
        .map(|address| Account::bare(address, chain_type))
        .collect()
}

fn transaction_rows(
    kind: TxKind,
    subset: &[ChainTransaction],
    chain_type: ChainType,
) -> Vec<AccountTransaction> {
    subset
        .iter()
        .map(|tx| AccountTransaction {
            kind,
            from_address: tx.from_address.clone(),
            from_chain_type: chain_type,
            to_address: tx.to_address.clone(),
            to_chain_type: chain_type,
            timestamp: tx.timestamp,
            amount: tx.amount,
        })
        .collect()
}

/// Synchronize one account: fetch fresh balances, reconcile both kinds
/// against the stored snapshot, and persist atomically.
///
/// Returns [`SyncError::AccountNotFound`] when the provider reports the
/// address does not exist on `chain_type`; fetch retries have already been
/// exhausted inside the fetch layer by the time an error surfaces here.
pub async fn reconcile(
    store: &LedgerStore,
    client: &reqwest::Client,
    config: &TrackerConfig,
    address: &str,
    chain_type: ChainType,
) -> Result<SyncResult, SyncError> {
    let reader = ChainReader::new(
        chain_type,
        address,
        config.api_keys(chain_type),
        config.api_url(chain_type),
    );
    let own_address = reader.address().to_string();

    let fetched = reader
        .get_balance(client)
        .await?
        .ok_or_else(|| SyncError::AccountNotFound {
            address: own_address.clone(),
            chain: chain_type,
        })?;

    let stored = store.read_account(&own_address, chain_type)?;
    let last_statement = store.last_statement(&own_address, chain_type)?;
    let op_timestamp = Utc::now();

    let mut transactions = Vec::new();
    let mut counterparties: Vec<Account> = Vec::new();

    for kind in TxKind::ALL {
        if !needs_reconcile(stored.as_ref(), &fetched, kind) {
            log::debug!(
                "{} balance of {} unchanged, skipping {} history",
                kind,
                own_address,
                kind
            );
            continue;
        }

        let page = match kind {
            TxKind::Native => reader.get_native_transactions(client).await?,
            TxKind::Token => reader.get_token_transactions(client).await?,
        };
        let stored_balance = stored.as_ref().map_or(0, |account| account.balance_of(kind));
        let subset = explaining_subset(
            &page,
            &own_address,
            stored_balance,
            fetched_balance_of(&fetched, kind),
        );
        if !subset.exact {
            log::warn!(
                "{} delta for {} not fully explained by {} fetched transactions; committing partial subset",
                kind,
                own_address,
                subset.transactions.len()
            );
        }

        for counterparty in counterparty_accounts(&subset.transactions, &own_address, chain_type) {
            if !counterparties
                .iter()
                .any(|existing| existing.address == counterparty.address)
            {
                counterparties.push(counterparty);
            }
        }
        transactions.extend(transaction_rows(kind, &subset.transactions, chain_type));
    }

    let mut account = Account::new(
        own_address.clone(),
        chain_type,
        fetched.native_balance,
        fetched.token_balance,
    );
    account.updated_at = op_timestamp;

    let statement = AccountStatement {
        account_address: own_address.clone(),
        chain_type,
        timestamp: op_timestamp,
        native_balance: fetched.native_balance,
        token_balance: fetched.token_balance,
    };
    let statement_op = if last_statement.is_some() {
        StatementOp::Update
    } else {
        StatementOp::Insert
    };

    let outcome = store.commit_sync(SyncBatch {
        account,
        statement,
        statement_op,
        transactions,
        counterparties,
    })?;

    log::info!(
        "Synced {} on {}: native={}, token={}, {} new transactions",
        own_address,
        chain_type,
        outcome.account.native_balance,
        outcome.account.token_balance,
        outcome.inserted_transactions
    );

    Ok(SyncResult {
        account: outcome.account,
        created_counterparties: outcome.created_counterparties,
        inserted_transactions: outcome.inserted_transactions,
    })
}

/// Probe one address string against every chain and aggregate the chains
/// that resolve. A failure on one chain never aborts probing the others;
/// Tron's address family does not overlap the EVM chains, so a TRC20 hit
/// short-circuits.
pub async fn probe_chains(
    client: &reqwest::Client,
    config: &TrackerConfig,
    address: &str,
) -> Vec<(ChainType, AccountBalance)> {
    let mut found = Vec::new();

    match probe_one(client, config, address, ChainType::Trc20).await {
        Ok(Some(balance)) => {
            found.push((ChainType::Trc20, balance));
            return found;
        }
        Ok(None) => {}
        Err(e) => log::warn!("TRC20 probe for {} failed: {}", address, e),
    }

    for chain in [ChainType::Erc20, ChainType::Bep20] {
        match probe_one(client, config, address, chain).await {
            Ok(Some(balance)) => found.push((chain, balance)),
            Ok(None) => {}
            Err(e) => log::warn!("{} probe for {} failed: {}", chain, address, e),
        }
    }

    found
}

async fn probe_one(
    client: &reqwest::Client,
    config: &TrackerConfig,
    address: &str,
    chain: ChainType,
) -> Result<Option<AccountBalance>, SyncError> {
    let reader = ChainReader::new(chain, address, config.api_keys(chain), config.api_url(chain));
    reader.get_balance(client).await
}
