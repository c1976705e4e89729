/// Common test utilities for chainbook integration tests
///
/// Spins up one explorer-mock instance per chain (so probing one address
/// never leaks fixtures across chains), a temp-dir ledger store, and a
/// tracker configuration pointing everything at the mocks.
use std::sync::Arc;

use chainbook::{LedgerStore, TrackerConfig};
use explorer_mock::{spawn_ephemeral, MockAccount, MockLedger, MockTx};
use tempfile::TempDir;

pub struct TestEnv {
    pub temp_dir: TempDir,
    pub store: LedgerStore,
    pub client: reqwest::Client,
    pub config: TrackerConfig,
    pub tron: Arc<MockLedger>,
    pub eth: Arc<MockLedger>,
    pub bsc: Arc<MockLedger>,
}

impl TestEnv {
    pub async fn new() -> anyhow::Result<Self> {
        let _ = env_logger::builder().is_test(true).try_init();

        let temp_dir = TempDir::new()?;
        let tron = Arc::new(MockLedger::new());
        let eth = Arc::new(MockLedger::new());
        let bsc = Arc::new(MockLedger::new());

        let (tron_addr, _tron_handle) = spawn_ephemeral(tron.clone()).await?;
        let (eth_addr, _eth_handle) = spawn_ephemeral(eth.clone()).await?;
        let (bsc_addr, _bsc_handle) = spawn_ephemeral(bsc.clone()).await?;

        let config = TrackerConfig {
            tron_api_keys: vec!["test-tron-key".to_string()],
            etherscan_api_keys: vec!["test-eth-key".to_string()],
            bscscan_api_keys: vec!["test-bsc-key".to_string()],
            tron_api_url: format!("http://{}/v1", tron_addr),
            etherscan_api_url: format!("http://{}/api", eth_addr),
            bscscan_api_url: format!("http://{}/api", bsc_addr),
            ledger_dir: temp_dir.path().display().to_string(),
        };
        let store = LedgerStore::open(temp_dir.path());

        Ok(Self {
            temp_dir,
            store,
            client: reqwest::Client::new(),
            config,
            tron,
            eth,
            bsc,
        })
    }
}

/// Base URL of a provider that refuses every connection: the port was bound
/// once to reserve it and released before any request goes out.
pub fn unreachable_url(path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}{}", addr, path)
}

pub fn mock_account(address: &str, native_balance: u128, token_balance: u128) -> MockAccount {
    let mut account = MockAccount::new(address);
    account.native_balance = native_balance.to_string();
    account.token_balance = token_balance.to_string();
    account
}

pub fn mock_tx(from: &str, to: &str, value: u128, timestamp: i64) -> MockTx {
    MockTx {
        from: from.to_string(),
        to: to.to_string(),
        value: value.to_string(),
        timestamp,
    }
}
