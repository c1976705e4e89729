//! Tron-style explorer reader
//!
//! One balance call returns both native and token balances. Transaction
//! records carry hex-encoded addresses that must be converted to the
//! canonical base58check display form before comparison or storage.

use serde::Deserialize;
use std::collections::HashMap;

use super::{pick_api_key, pick_user_agent, timestamp_from_millis, AccountBalance, ChainTransaction};
use crate::chain::ChainType;
use crate::error::SyncError;
use crate::fetch::{fetch_json, FetchRequest};

const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";
const TRANSFER_CONTRACT: &str = "TransferContract";

pub struct TronReader {
    address: String,
    base_url: String,
    token_contract: String,
    api_key: String,
    user_agent: &'static str,
}

#[derive(Debug, Deserialize)]
struct TronAccountResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<TronAccountData>,
}

#[derive(Debug, Deserialize)]
struct TronAccountData {
    #[serde(default)]
    balance: Option<u128>,
    #[serde(default)]
    trc20: Option<Vec<HashMap<String, String>>>,
}

#[derive(Debug, Deserialize)]
struct TronTxListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<TronTxRecord>,
}

#[derive(Debug, Deserialize)]
struct TronTxRecord {
    block_timestamp: i64,
    raw_data: TronRawData,
}

#[derive(Debug, Deserialize)]
struct TronRawData {
    #[serde(default)]
    contract: Vec<TronContract>,
}

#[derive(Debug, Deserialize)]
struct TronContract {
    #[serde(rename = "type")]
    contract_type: String,
    parameter: TronParameter,
}

#[derive(Debug, Deserialize)]
struct TronParameter {
    value: TronTransferValue,
}

/// Only TransferContract entries populate all three fields; other contract
/// kinds deserialize with defaults and are skipped.
#[derive(Debug, Deserialize)]
struct TronTransferValue {
    #[serde(default)]
    amount: u128,
    #[serde(default)]
    owner_address: String,
    #[serde(default)]
    to_address: String,
}

#[derive(Debug, Deserialize)]
struct TronTrc20ListResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<TronTrc20Record>,
}

#[derive(Debug, Deserialize)]
struct TronTrc20Record {
    from: String,
    to: String,
    value: String,
    block_timestamp: i64,
}

/// Convert a hex-encoded Tron address to base58check display form.
/// A `0x`-prefixed EVM-style hex is rebased onto the Tron `41` prefix.
pub fn hex_to_base58(hex_address: &str) -> Result<String, SyncError> {
    let normalized = match hex_address
        .strip_prefix("0x")
        .or_else(|| hex_address.strip_prefix("0X"))
    {
        Some(stripped) => format!("41{}", stripped),
        None => hex_address.to_string(),
    };
    let bytes = hex::decode(&normalized).map_err(|e| {
        SyncError::FetchFailed(format!("Invalid hex address {}: {}", hex_address, e))
    })?;
    Ok(bs58::encode(bytes).with_check().into_string())
}

impl TronReader {
    pub fn new(address: &str, api_keys: &[String], base_url: &str) -> Self {
        Self {
            address: ChainType::Trc20.canonical_address(address),
            base_url: base_url.trim_end_matches('/').to_string(),
            token_contract: ChainType::Trc20.token_contract().to_string(),
            api_key: pick_api_key(api_keys),
            user_agent: pick_user_agent(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn request(&self, url: String) -> FetchRequest {
        let mut request = FetchRequest::json(url)
            .header("User-Agent", self.user_agent)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        if !self.api_key.is_empty() {
            request = request.header(API_KEY_HEADER, self.api_key.as_str());
        }
        request
    }

    pub async fn get_balance(
        &self,
        client: &reqwest::Client,
    ) -> Result<Option<AccountBalance>, SyncError> {
        let url = format!("{}/accounts/{}", self.base_url, self.address);
        let response: TronAccountResponse = fetch_json(client, &self.request(url)).await?;
        if !response.success {
            return Ok(None);
        }
        let data = match response.data.into_iter().next() {
            Some(data) => data,
            None => return Ok(None),
        };

        let native_balance = data.balance.unwrap_or(0);
        let token_balance = match data
            .trc20
            .iter()
            .flatten()
            .find_map(|entry| entry.get(&self.token_contract))
        {
            Some(raw) => raw.parse::<u128>().map_err(|e| {
                SyncError::InvalidAmount(format!("trc20 balance {:?}: {}", raw, e))
            })?,
            None => 0,
        };

        Ok(Some(AccountBalance {
            address: self.address.clone(),
            native_balance,
            token_balance,
        }))
    }

    pub async fn get_native_transactions(
        &self,
        client: &reqwest::Client,
    ) -> Result<Vec<ChainTransaction>, SyncError> {
        let url = format!("{}/accounts/{}/transactions", self.base_url, self.address);
        let request = self
            .request(url)
            .param("only_confirmed", "true")
            .param("search_internal", "false");
        let response: TronTxListResponse = fetch_json(client, &request).await?;
        if !response.success {
            log::warn!(
                "Tron native transaction list for {} returned non-success",
                self.address
            );
            return Ok(Vec::new());
        }

        let mut transactions = Vec::new();
        for record in response.data {
            match self.process_native_record(&record) {
                Ok(Some(tx)) => transactions.push(tx),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping malformed Tron transaction: {}", e),
            }
        }
        Ok(transactions)
    }

    fn process_native_record(
        &self,
        record: &TronTxRecord,
    ) -> Result<Option<ChainTransaction>, SyncError> {
        let contract = match record.raw_data.contract.first() {
            Some(contract) if contract.contract_type == TRANSFER_CONTRACT => contract,
            _ => return Ok(None),
        };
        let value = &contract.parameter.value;
        if value.amount == 0 {
            return Ok(None);
        }
        let timestamp = match timestamp_from_millis(record.block_timestamp) {
            Some(ts) => ts,
            None => return Ok(None),
        };

        Ok(Some(ChainTransaction {
            from_address: hex_to_base58(&value.owner_address)?,
            to_address: hex_to_base58(&value.to_address)?,
            amount: value.amount,
            timestamp,
        }))
    }

    pub async fn get_token_transactions(
        &self,
        client: &reqwest::Client,
    ) -> Result<Vec<ChainTransaction>, SyncError> {
        let url = format!(
            "{}/accounts/{}/transactions/trc20",
            self.base_url, self.address
        );
        let request = self
            .request(url)
            .param("contract_address", &self.token_contract)
            .param("only_confirmed", "true");
        let response: TronTrc20ListResponse = fetch_json(client, &request).await?;
        if !response.success {
            log::warn!(
                "Tron token transaction list for {} returned non-success",
                self.address
            );
            return Ok(Vec::new());
        }

        let mut transactions = Vec::new();
        for record in response.data {
            let amount = record.value.parse::<u128>().map_err(|e| {
                SyncError::InvalidAmount(format!("trc20 value {:?}: {}", record.value, e))
            })?;
            if amount == 0 {
                continue;
            }
            let timestamp = match timestamp_from_millis(record.block_timestamp) {
                Some(ts) => ts,
                None => continue,
            };
            transactions.push(ChainTransaction {
                from_address: record.from,
                to_address: record.to,
                amount,
                timestamp,
            });
        }
        Ok(transactions)
    }
}
