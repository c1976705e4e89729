/// Explorer Mock Server
///
/// Serves Tron-style and Etherscan-style explorer endpoints from an
/// in-memory fixture ledger, for local development and testing.
use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use explorer_mock::state::MockLedger;

#[derive(Debug)]
struct Config {
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3100".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        Ok(Self {
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting explorer mock server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    let ledger = Arc::new(MockLedger::new());

    explorer_mock::run_server(ledger, config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
