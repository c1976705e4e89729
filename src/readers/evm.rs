//! EVM-style explorer reader (Etherscan query protocol)
//!
//! One variant serves both Ethereum and BSC, parameterized by base URL and
//! tracked token contract. Balances arrive from two sequential calls paced
//! by a fixed delay; both must succeed for the account to count as present.

use serde::Deserialize;
use std::time::Duration;

use super::{pick_api_key, pick_user_agent, timestamp_from_secs, AccountBalance, ChainTransaction};
use crate::chain::ChainType;
use crate::error::SyncError;
use crate::fetch::{fetch_json, FetchRequest};

/// Pause between the native and token balance sub-calls; free-tier explorer
/// keys are rate limited per second.
const BALANCE_PACING: Duration = Duration::from_millis(200);
const PAGE_SIZE: u32 = 100;

pub struct EvmReader {
    chain: ChainType,
    address: String,
    base_url: String,
    token_contract: String,
    api_key: String,
    user_agent: &'static str,
}

/// Etherscan wraps every payload in {status, message, result}; the result
/// shape depends on the action and on whether the call succeeded, so it is
/// decoded in a second step only after `message == "OK"`.
#[derive(Debug, Deserialize)]
struct EtherscanEnvelope {
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

impl EtherscanEnvelope {
    fn is_ok(&self) -> bool {
        self.message == "OK"
    }
}

#[derive(Debug, Deserialize)]
struct EvmTxRecord {
    from: String,
    to: String,
    value: String,
    #[serde(rename = "timeStamp")]
    time_stamp: String,
}

impl EvmReader {
    pub fn new(chain: ChainType, address: &str, api_keys: &[String], base_url: &str) -> Self {
        Self {
            chain,
            address: chain.canonical_address(address),
            base_url: base_url.trim_end_matches('/').to_string(),
            token_contract: chain.canonical_address(chain.token_contract()),
            api_key: pick_api_key(api_keys),
            user_agent: pick_user_agent(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn request(&self, action: &str) -> FetchRequest {
        FetchRequest::json(&self.base_url)
            .header("User-Agent", self.user_agent)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .param("module", "account")
            .param("action", action)
            .param("address", &self.address)
            .param("apikey", &self.api_key)
    }

    pub async fn get_balance(
        &self,
        client: &reqwest::Client,
    ) -> Result<Option<AccountBalance>, SyncError> {
        let request = self.request("balance").param("tag", "latest");
        let native: EtherscanEnvelope = fetch_json(client, &request).await?;
        if !native.is_ok() {
            return Ok(None);
        }

        tokio::time::sleep(BALANCE_PACING).await;

        let request = self
            .request("tokenbalance")
            .param("contractaddress", &self.token_contract)
            .param("tag", "latest");
        let token: EtherscanEnvelope = fetch_json(client, &request).await?;
        if !token.is_ok() {
            return Ok(None);
        }

        Ok(Some(AccountBalance {
            address: self.address.clone(),
            native_balance: parse_balance(&native.result)?,
            token_balance: parse_balance(&token.result)?,
        }))
    }

    pub async fn get_native_transactions(
        &self,
        client: &reqwest::Client,
    ) -> Result<Vec<ChainTransaction>, SyncError> {
        let request = self.tx_list_request("txlist");
        self.fetch_transactions(client, request).await
    }

    pub async fn get_token_transactions(
        &self,
        client: &reqwest::Client,
    ) -> Result<Vec<ChainTransaction>, SyncError> {
        let request = self
            .tx_list_request("tokentx")
            .param("contractaddress", &self.token_contract);
        self.fetch_transactions(client, request).await
    }

    fn tx_list_request(&self, action: &str) -> FetchRequest {
        self.request(action)
            .param("page", "1")
            .param("offset", PAGE_SIZE.to_string())
            .param("startblock", "0")
            .param("endblock", "99999999")
            .param("sort", "desc")
    }

    async fn fetch_transactions(
        &self,
        client: &reqwest::Client,
        request: FetchRequest,
    ) -> Result<Vec<ChainTransaction>, SyncError> {
        let envelope: EtherscanEnvelope = fetch_json(client, &request).await?;
        if !envelope.is_ok() {
            log::warn!(
                "{} transaction list for {} returned {:?}",
                self.chain,
                self.address,
                envelope.message
            );
            return Ok(Vec::new());
        }

        let records: Vec<EvmTxRecord> = serde_json::from_value(envelope.result)
            .map_err(|e| SyncError::FetchFailed(format!("decoding transaction list: {}", e)))?;

        let mut transactions = Vec::new();
        for record in records {
            let amount = record.value.parse::<u128>().map_err(|e| {
                SyncError::InvalidAmount(format!("transfer value {:?}: {}", record.value, e))
            })?;
            if amount == 0 {
                continue;
            }
            let secs = record.time_stamp.parse::<i64>().map_err(|e| {
                SyncError::InvalidAmount(format!("timestamp {:?}: {}", record.time_stamp, e))
            })?;
            let timestamp = match timestamp_from_secs(secs) {
                Some(ts) => ts,
                None => continue,
            };
            transactions.push(ChainTransaction {
                from_address: self.chain.canonical_address(&record.from),
                to_address: self.chain.canonical_address(&record.to),
                amount,
                timestamp,
            });
        }
        Ok(transactions)
    }
}

fn parse_balance(result: &serde_json::Value) -> Result<u128, SyncError> {
    let raw = result
        .as_str()
        .ok_or_else(|| SyncError::InvalidAmount(format!("balance result {:?}", result)))?;
    raw.parse::<u128>()
        .map_err(|e| SyncError::InvalidAmount(format!("balance {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_lowercased() {
        let reader = EvmReader::new(
            ChainType::Erc20,
            "0xDAC17F958d2EE523a2206206994597C13D831ec7",
            &[],
            "http://localhost/api",
        );
        assert_eq!(reader.address(), "0xdac17f958d2ee523a2206206994597c13d831ec7");
        assert_eq!(reader.token_contract, ChainType::Erc20.token_contract());
    }

    #[test]
    fn test_envelope_not_ok() {
        let envelope: EtherscanEnvelope = serde_json::from_str(
            r#"{"status": "0", "message": "NOTOK", "result": "Max rate limit reached"}"#,
        )
        .unwrap();
        assert!(!envelope.is_ok());
    }

    #[test]
    fn test_parse_balance() {
        let value = serde_json::json!("123456789000000000000");
        assert_eq!(parse_balance(&value).unwrap(), 123_456_789_000_000_000_000);
        assert!(parse_balance(&serde_json::json!(["unexpected"])).is_err());
    }

    #[test]
    fn test_tx_record_parsing() {
        let record: EvmTxRecord = serde_json::from_str(
            r#"{"from": "0xAA", "to": "0xBB", "value": "5000", "timeStamp": "1700000000",
                "hash": "0x1234", "blockNumber": "18000000"}"#,
        )
        .unwrap();
        assert_eq!(record.value, "5000");
        assert_eq!(record.time_stamp, "1700000000");
    }
}
