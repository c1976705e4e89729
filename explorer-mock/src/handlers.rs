/// Axum HTTP handlers for both mock explorer API families
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::{MockAccount, MockLedger, MockTx};

/// Shared application state
pub type AppState = Arc<MockLedger>;

/// GET /health
pub async fn health_check() -> &'static str {
    "ok"
}

/// GET /v1/accounts/{address}
/// Tron-style account payload: balance and trc20 token holdings in one call
pub async fn tron_account(
    State(ledger): State<AppState>,
    Path(address): Path<String>,
) -> Json<Value> {
    match ledger.get(&address) {
        Some(account) if account.exists => {
            let mut data = serde_json::Map::new();
            data.insert(
                "balance".to_string(),
                json!(parse_amount(&account.native_balance)),
            );
            if !account.token_contract.is_empty() {
                let mut holding = serde_json::Map::new();
                holding.insert(account.token_contract.clone(), json!(account.token_balance));
                data.insert("trc20".to_string(), json!([holding]));
            }
            Json(json!({ "success": true, "data": [data] }))
        }
        // Deactivated fixtures answer an explicit failure; never-seeded
        // addresses answer success with an empty data list, the way the real
        // endpoint does for accounts it has never observed
        Some(_) => Json(json!({ "success": false, "data": [] })),
        None => Json(json!({ "success": true, "data": [] })),
    }
}

/// GET /v1/accounts/{address}/transactions
/// Tron native transfers as TransferContract records, most recent first
pub async fn tron_native_transactions(
    State(ledger): State<AppState>,
    Path(address): Path<String>,
) -> Json<Value> {
    match ledger.get(&address) {
        Some(account) if account.exists => {
            let data: Vec<Value> = account
                .native_txs
                .iter()
                .map(|tx| {
                    json!({
                        "block_timestamp": tx.timestamp * 1000,
                        "raw_data": {
                            "contract": [{
                                "type": "TransferContract",
                                "parameter": {
                                    "value": {
                                        "amount": parse_amount(&tx.value),
                                        "owner_address": tx.from,
                                        "to_address": tx.to,
                                    }
                                }
                            }]
                        }
                    })
                })
                .collect();
            Json(json!({ "success": true, "data": data }))
        }
        _ => Json(json!({ "success": false, "data": [] })),
    }
}

/// GET /v1/accounts/{address}/transactions/trc20
pub async fn tron_token_transactions(
    State(ledger): State<AppState>,
    Path(address): Path<String>,
) -> Json<Value> {
    match ledger.get(&address) {
        Some(account) if account.exists => {
            let data: Vec<Value> = account.token_txs.iter().map(trc20_record).collect();
            Json(json!({ "success": true, "data": data }))
        }
        _ => Json(json!({ "success": false, "data": [] })),
    }
}

fn trc20_record(tx: &MockTx) -> Value {
    json!({
        "from": tx.from,
        "to": tx.to,
        "value": tx.value,
        "block_timestamp": tx.timestamp * 1000,
    })
}

/// GET /api?module=account&action={balance|tokenbalance|txlist|tokentx}&...
/// Etherscan-style dispatch on the `action` query parameter
pub async fn etherscan_api(
    State(ledger): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let action = params.get("action").map(String::as_str).unwrap_or("");
    let address = params.get("address").map(String::as_str).unwrap_or("");
    let account = ledger.get(address).filter(|account| account.exists);

    let response = match (action, account) {
        ("balance", Some(account)) => ok_result(json!(account.native_balance)),
        ("tokenbalance", Some(account)) if !account.token_call_fails => {
            ok_result(json!(account.token_balance))
        }
        ("txlist", Some(account)) => ok_result(tx_records(&account.native_txs)),
        ("tokentx", Some(account)) => ok_result(tx_records(&account.token_txs)),
        _ => json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Error! Missing or invalid parameters",
        }),
    };
    Json(response)
}

fn ok_result(result: Value) -> Value {
    json!({ "status": "1", "message": "OK", "result": result })
}

fn tx_records(txs: &[MockTx]) -> Value {
    let records: Vec<Value> = txs
        .iter()
        .map(|tx| {
            json!({
                "from": tx.from,
                "to": tx.to,
                "value": tx.value,
                "timeStamp": tx.timestamp.to_string(),
            })
        })
        .collect();
    Value::Array(records)
}

/// POST /fixtures/account
pub async fn put_fixture_account(
    State(ledger): State<AppState>,
    Json(account): Json<MockAccount>,
) -> StatusCode {
    log::debug!("Fixture account set: {}", account.address);
    ledger.put_account(account);
    StatusCode::NO_CONTENT
}

/// POST /fixtures/reset
pub async fn reset_fixtures(State(ledger): State<AppState>) -> StatusCode {
    ledger.reset();
    StatusCode::NO_CONTENT
}

fn parse_amount(raw: &str) -> u64 {
    raw.parse().unwrap_or(0)
}
