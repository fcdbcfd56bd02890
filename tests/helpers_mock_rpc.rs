//! Mock JSON-RPC response builders for wiremock servers
//!
//! Each function mounts a mock for one RPC method, matched on the
//! JSON-RPC `method` field of the request body. Responses mirror the
//! envelope shapes real Solana RPC nodes return.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a getSlot mock returning the given slot.
#[allow(dead_code)]
pub async fn mock_get_slot(server: &MockServer, slot: u64) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "getSlot" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": slot,
            "id": 1
        })))
        .mount(server)
        .await;
}

/// Mount a getTokenSupply mock returning the given decimals for every mint.
#[allow(dead_code)]
pub async fn mock_token_supply(server: &MockServer, decimals: u8) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "getTokenSupply" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": {
                "context": { "slot": 1 },
                "value": {
                    "amount": "1000000000",
                    "decimals": decimals,
                    "uiAmount": 1000.0,
                    "uiAmountString": "1000"
                }
            },
            "id": 1
        })))
        .mount(server)
        .await;
}

/// Mount a getTokenAccountBalance mock returning the given balance for every
/// account (both pool vaults in quote tests).
#[allow(dead_code)]
pub async fn mock_get_token_account_balance(server: &MockServer, ui_amount: f64, decimals: u8) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(
            json!({ "method": "getTokenAccountBalance" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": {
                "context": { "slot": 1 },
                "value": {
                    "amount": "1000000",
                    "decimals": decimals,
                    "uiAmount": ui_amount,
                    "uiAmountString": ui_amount.to_string()
                }
            },
            "id": 1
        })))
        .mount(server)
        .await;
}

/// Mount a getTokenAccountsByOwner mock returning the given accounts, each a
/// (pubkey, ui_amount, decimals) triple.
#[allow(dead_code)]
pub async fn mock_token_accounts_by_owner(server: &MockServer, accounts: &[(&str, f64, u8)]) {
    let value: Vec<serde_json::Value> = accounts
        .iter()
        .map(|(pubkey, ui_amount, decimals)| {
            json!({
                "pubkey": pubkey,
                "account": {
                    "lamports": 2039280,
                    "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                    "executable": false,
                    "rentEpoch": 0,
                    "data": {
                        "program": "spl-token",
                        "space": 165,
                        "parsed": {
                            "type": "account",
                            "info": {
                                "tokenAmount": {
                                    "amount": "1000000",
                                    "decimals": decimals,
                                    "uiAmount": ui_amount,
                                    "uiAmountString": ui_amount.to_string()
                                }
                            }
                        }
                    }
                }
            })
        })
        .collect();

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(
            json!({ "method": "getTokenAccountsByOwner" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": { "context": { "slot": 1 }, "value": value },
            "id": 1
        })))
        .mount(server)
        .await;
}

/// Mount a getTokenAccountsByOwner mock returning no accounts (the
/// not-found condition).
#[allow(dead_code)]
pub async fn mock_no_token_accounts(server: &MockServer) {
    mock_token_accounts_by_owner(server, &[]).await;
}

/// Mount a sendTransaction mock returning a signature.
///
/// # Arguments
///
/// * `expect` - Expected number of calls, verified when the server drops
#[allow(dead_code)]
pub async fn mock_send_transaction_success(server: &MockServer, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "sendTransaction" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": "5VERYrealLOOKINGsignature111111111111111111111111111111111111111",
            "id": 1
        })))
        .expect(expect)
        .mount(server)
        .await;
}

/// Mount a sendTransaction mock that fails once (JSON-RPC error), then stops
/// matching so a later success mock can take over for the retry path.
#[allow(dead_code)]
pub async fn mock_send_transaction_failure(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "sendTransaction" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "error": { "code": -32002, "message": "Transaction simulation failed" },
            "id": 1
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Mount a getProgramAccounts mock (the proposal snapshot refresh read).
///
/// # Arguments
///
/// * `expect` - Expected number of calls, verified when the server drops
#[allow(dead_code)]
pub async fn mock_get_program_accounts(server: &MockServer, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "getProgramAccounts" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": [],
            "id": 1
        })))
        .expect(expect)
        .mount(server)
        .await;
}
