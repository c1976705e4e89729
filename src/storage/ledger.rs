use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::models::{Account, AccountStatement, AccountTransaction};
use crate::chain::ChainType;
use crate::error::StorageError;

const LEDGER_FILE: &str = "ledger.json";

/// The whole persisted ledger as one document. A sync commit mutates a
/// loaded copy and writes it back atomically (temp file + rename), so the
/// three writes of one sync are never partially visible.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerData {
    accounts: BTreeMap<String, Account>,
    /// Chronological statements per account key; the last entry is "current"
    statements: BTreeMap<String, Vec<AccountStatement>>,
    /// Keyed by the transaction natural key, which deduplicates inserts
    transactions: BTreeMap<String, AccountTransaction>,
}

fn account_key(address: &str, chain_type: ChainType) -> String {
    format!("{}|{}", chain_type, address)
}

/// Which statement write a sync performs. Exactly one of the two happens,
/// never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOp {
    /// First statement for this account
    Insert,
    /// Overwrite the current latest statement in place
    Update,
}

/// Everything one sync wants persisted, committed all-or-nothing
#[derive(Debug)]
pub struct SyncBatch {
    pub account: Account,
    pub statement: AccountStatement,
    pub statement_op: StatementOp,
    pub transactions: Vec<AccountTransaction>,
    pub counterparties: Vec<Account>,
}

#[derive(Debug)]
pub struct CommitOutcome {
    /// The account row as persisted (created_at preserved across upserts)
    pub account: Account,
    pub inserted_transactions: usize,
    pub created_counterparties: usize,
}

#[derive(Clone)]
pub struct LedgerStore {
    base_path: PathBuf,
    write_guard: Arc<Mutex<()>>,
}

impl LedgerStore {
    /// Open (or create on first commit) a ledger store in `base_path`
    pub fn open(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            write_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_path
    }

    fn ledger_path(&self) -> PathBuf {
        self.base_path.join(LEDGER_FILE)
    }

    fn load(&self) -> Result<LedgerData, StorageError> {
        let path = self.ledger_path();
        if !path.exists() {
            return Ok(LedgerData::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, data: &LedgerData) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;
        let tmp_path = self.base_path.join(format!("{}.tmp", LEDGER_FILE));
        let json = serde_json::to_string_pretty(data)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, self.ledger_path())?;
        Ok(())
    }

    pub fn read_account(
        &self,
        address: &str,
        chain_type: ChainType,
    ) -> Result<Option<Account>, StorageError> {
        let data = self.load()?;
        Ok(data.accounts.get(&account_key(address, chain_type)).cloned())
    }

    pub fn account_count(&self) -> Result<usize, StorageError> {
        Ok(self.load()?.accounts.len())
    }

    /// The single statement treated as "current" for delta comparison
    pub fn last_statement(
        &self,
        address: &str,
        chain_type: ChainType,
    ) -> Result<Option<AccountStatement>, StorageError> {
        let data = self.load()?;
        Ok(data
            .statements
            .get(&account_key(address, chain_type))
            .and_then(|history| history.last().cloned()))
    }

    pub fn statements_for(
        &self,
        address: &str,
        chain_type: ChainType,
    ) -> Result<Vec<AccountStatement>, StorageError> {
        let data = self.load()?;
        Ok(data
            .statements
            .get(&account_key(address, chain_type))
            .cloned()
            .unwrap_or_default())
    }

    /// All ledger edges touching one account, in natural-key order
    pub fn transactions_for(
        &self,
        address: &str,
        chain_type: ChainType,
    ) -> Result<Vec<AccountTransaction>, StorageError> {
        let data = self.load()?;
        Ok(data
            .transactions
            .values()
            .filter(|tx| {
                (tx.from_address == address && tx.from_chain_type == chain_type)
                    || (tx.to_address == address && tx.to_chain_type == chain_type)
            })
            .cloned()
            .collect())
    }

    pub fn transaction_count(&self) -> Result<usize, StorageError> {
        Ok(self.load()?.transactions.len())
    }

    /// Commit one sync as a single all-or-nothing unit: account upsert,
    /// statement insert-or-update, deduplicated transaction and counterparty
    /// inserts. Any integrity violation aborts without writing.
    pub fn commit_sync(&self, batch: SyncBatch) -> Result<CommitOutcome, StorageError> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| StorageError::Conflict("ledger write lock poisoned".to_string()))?;

        let mut data = self.load()?;

        let account = upsert_account(&mut data, batch.account);
        apply_statement(&mut data, batch.statement, batch.statement_op)?;

        let mut created_counterparties = 0;
        for counterparty in batch.counterparties {
            if counterparty.address == account.address
                && counterparty.chain_type == account.chain_type
            {
                return Err(StorageError::Conflict(format!(
                    "Counterparty row duplicates the synced account {}",
                    account.address
                )));
            }
            let key = account_key(&counterparty.address, counterparty.chain_type);
            if !data.accounts.contains_key(&key) {
                data.accounts.insert(key, counterparty);
                created_counterparties += 1;
            }
        }

        let mut inserted_transactions = 0;
        for tx in batch.transactions {
            let key = tx.natural_key();
            if !data.transactions.contains_key(&key) {
                data.transactions.insert(key, tx);
                inserted_transactions += 1;
            }
        }

        self.save(&data)?;

        log::debug!(
            "Committed sync for {} ({}): {} new transactions, {} new counterparties",
            account.address,
            account.chain_type,
            inserted_transactions,
            created_counterparties
        );

        Ok(CommitOutcome {
            account,
            inserted_transactions,
            created_counterparties,
        })
    }
}

/// Primary-key conflict overwrites balances and updated_at, never created_at
fn upsert_account(data: &mut LedgerData, mut account: Account) -> Account {
    let key = account_key(&account.address, account.chain_type);
    if let Some(existing) = data.accounts.get(&key) {
        account.created_at = existing.created_at;
    }
    data.accounts.insert(key, account.clone());
    account
}

fn apply_statement(
    data: &mut LedgerData,
    statement: AccountStatement,
    op: StatementOp,
) -> Result<(), StorageError> {
    let key = account_key(&statement.account_address, statement.chain_type);
    let history = data.statements.entry(key).or_default();
    match op {
        StatementOp::Insert => {
            if !history.is_empty() {
                return Err(StorageError::Conflict(format!(
                    "Statement insert for {} but a current statement already exists",
                    statement.account_address
                )));
            }
            history.push(statement);
        }
        StatementOp::Update => match history.last_mut() {
            Some(current) => *current = statement,
            None => {
                return Err(StorageError::Conflict(format!(
                    "Statement update for {} but no statement exists",
                    statement.account_address
                )));
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::TxKind;
    use chrono::Utc;
    use tempfile::TempDir;

    fn store() -> (TempDir, LedgerStore) {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path());
        (dir, store)
    }

    fn batch_for(account: Account, op: StatementOp) -> SyncBatch {
        let statement = AccountStatement {
            account_address: account.address.clone(),
            chain_type: account.chain_type,
            timestamp: Utc::now(),
            native_balance: account.native_balance,
            token_balance: account.token_balance,
        };
        SyncBatch {
            account,
            statement,
            statement_op: op,
            transactions: Vec::new(),
            counterparties: Vec::new(),
        }
    }

    #[test]
    fn test_empty_store_reads() {
        let (_dir, store) = store();
        assert!(store.read_account("0xaa", ChainType::Erc20).unwrap().is_none());
        assert!(store.last_statement("0xaa", ChainType::Erc20).unwrap().is_none());
        assert_eq!(store.account_count().unwrap(), 0);
    }

    #[test]
    fn test_statement_update_without_existing_is_conflict() {
        let (_dir, store) = store();
        let account = Account::new("0xaa", ChainType::Erc20, 10, 0);
        let result = store.commit_sync(batch_for(account, StatementOp::Update));
        assert!(matches!(result, Err(StorageError::Conflict(_))));
        // nothing was committed
        assert_eq!(store.account_count().unwrap(), 0);
    }

    #[test]
    fn test_transaction_insert_ignores_duplicates() {
        let (_dir, store) = store();
        let account = Account::new("0xaa", ChainType::Erc20, 10, 0);
        let ts = Utc::now();
        let tx = AccountTransaction {
            kind: TxKind::Native,
            from_address: "0xbb".into(),
            from_chain_type: ChainType::Erc20,
            to_address: "0xaa".into(),
            to_chain_type: ChainType::Erc20,
            timestamp: ts,
            amount: 10,
        };

        let mut batch = batch_for(account.clone(), StatementOp::Insert);
        batch.transactions = vec![tx.clone(), tx.clone()];
        let outcome = store.commit_sync(batch).unwrap();
        assert_eq!(outcome.inserted_transactions, 1);

        let mut batch = batch_for(account, StatementOp::Update);
        batch.transactions = vec![tx];
        let outcome = store.commit_sync(batch).unwrap();
        assert_eq!(outcome.inserted_transactions, 0);
        assert_eq!(store.transaction_count().unwrap(), 1);
    }

    #[test]
    fn test_upsert_preserves_created_at() {
        let (_dir, store) = store();
        let first = Account::new("0xaa", ChainType::Erc20, 10, 0);
        let created = first.created_at;
        store.commit_sync(batch_for(first, StatementOp::Insert)).unwrap();

        let mut second = Account::new("0xaa", ChainType::Erc20, 99, 5);
        second.updated_at = created + chrono::Duration::seconds(30);
        let outcome = store.commit_sync(batch_for(second, StatementOp::Update)).unwrap();

        assert_eq!(outcome.account.created_at, created);
        assert!(outcome.account.updated_at > created);
        assert_eq!(outcome.account.native_balance, 99);
    }

    #[test]
    fn test_counterparties_created_once() {
        let (_dir, store) = store();
        let account = Account::new("0xaa", ChainType::Erc20, 10, 0);

        let mut batch = batch_for(account.clone(), StatementOp::Insert);
        batch.counterparties = vec![Account::bare("0xbb", ChainType::Erc20)];
        let outcome = store.commit_sync(batch).unwrap();
        assert_eq!(outcome.created_counterparties, 1);

        let mut batch = batch_for(account, StatementOp::Update);
        batch.counterparties = vec![Account::bare("0xbb", ChainType::Erc20)];
        let outcome = store.commit_sync(batch).unwrap();
        assert_eq!(outcome.created_counterparties, 0);
        assert_eq!(store.account_count().unwrap(), 2);
    }

    #[test]
    fn test_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = LedgerStore::open(dir.path());
            let account = Account::new("TAddr", ChainType::Trc20, 7, 3);
            store.commit_sync(batch_for(account, StatementOp::Insert)).unwrap();
        }
        let store = LedgerStore::open(dir.path());
        let account = store.read_account("TAddr", ChainType::Trc20).unwrap().unwrap();
        assert_eq!(account.native_balance, 7);
        assert_eq!(store.statements_for("TAddr", ChainType::Trc20).unwrap().len(), 1);
    }
}
