//! Solana JSON-RPC Client Module
//!
//! This module provides the minimal chain access the instruction lifecycle
//! needs: current slot, token mint metadata (supply/decimals), governed
//! token-account balances, transaction submission, and the proposal snapshot
//! refresh read. The chain is treated as an external service; no signing or
//! consensus logic lives here.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use std::time::Duration;
use tracing::info;

use crate::error::LifecycleError;

// ============================================================================
// RESULT STRUCTURES
// ============================================================================

/// Token mint supply info as returned by getTokenSupply.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenAmount {
    /// Raw integer amount in base units, as a decimal string
    pub amount: String,
    /// Authoritative decimals of the mint
    pub decimals: u8,
}

/// Balance of a single token account as returned by getTokenAccountBalance.
#[derive(Debug, Clone, Deserialize)]
pub struct UiTokenAmount {
    /// Balance in decimal units (null on some RPCs for zero balances)
    #[serde(rename = "uiAmount", default, deserialize_with = "null_as_zero")]
    pub ui_amount: f64,
    /// Authoritative decimals of the mint
    pub decimals: u8,
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.unwrap_or(0.0))
}

/// Balance and decimals for a governed token account.
#[derive(Debug, Clone)]
pub struct TokenAccountInfo {
    /// Authoritative decimals of the mint
    pub decimals: u8,
    /// Largest balance across the owner's accounts for the mint, decimal units
    pub max_balance: f64,
}

// ============================================================================
// JSON-RPC TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct KeyedParsedAccount {
    #[allow(dead_code)]
    pubkey: String,
    account: ParsedAccount,
}

#[derive(Debug, Deserialize)]
struct ParsedAccount {
    data: ParsedAccountData,
}

#[derive(Debug, Deserialize)]
struct ParsedAccountData {
    parsed: serde_json::Value,
}

// ============================================================================
// CLIENT
// ============================================================================

/// Chain query client for the instruction lifecycle.
pub struct RpcClient {
    client: Client,
    rpc_url: String,
}

impl RpcClient {
    /// Creates a client for the given RPC endpoint.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            rpc_url: rpc_url.to_string(),
        })
    }

    /// Returns the chain's current slot.
    pub async fn get_slot(&self) -> Result<u64> {
        let slot: u64 = self.call("getSlot", serde_json::json!([])).await?;
        Ok(slot)
    }

    /// Fetches supply and decimals for a token mint.
    ///
    /// Decimals must be fetched fresh at build time - callers must not cache
    /// them across pool selections.
    pub async fn get_token_supply(&self, mint: &Pubkey) -> Result<TokenAmount> {
        let result: RpcValue<TokenAmount> = self
            .call("getTokenSupply", serde_json::json!([mint.to_string()]))
            .await?;
        Ok(result.value)
    }

    /// Fetches decimals and the largest balance among the owner's token
    /// accounts for a mint.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenAccountInfo)` - At least one token account exists
    /// * `Err(LifecycleError::TokenAccountNotFound)` - Owner has no token
    ///   account for the mint (recoverable; surfaced as a notification)
    pub async fn get_token_account_balance_by_owner(
        &self,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<TokenAccountInfo> {
        let params = serde_json::json!([
            owner.to_string(),
            { "mint": mint.to_string() },
            { "encoding": "jsonParsed" }
        ]);

        let result: RpcValue<Vec<KeyedParsedAccount>> =
            self.call("getTokenAccountsByOwner", params).await?;

        let mut best: Option<TokenAccountInfo> = None;
        for keyed in result.value {
            let token_amount = &keyed.account.data.parsed["info"]["tokenAmount"];
            let decimals = token_amount["decimals"]
                .as_u64()
                .context("Missing decimals in token account data")? as u8;
            let balance = token_amount["uiAmount"].as_f64().unwrap_or(0.0);

            let better = match &best {
                Some(current) => balance > current.max_balance,
                None => true,
            };
            if better {
                best = Some(TokenAccountInfo {
                    decimals,
                    max_balance: balance,
                });
            }
        }

        best.ok_or_else(|| {
            anyhow::Error::new(LifecycleError::TokenAccountNotFound {
                mint: mint.to_string(),
                owner: owner.to_string(),
            })
        })
    }

    /// Fetches the balance of a single token account (e.g. a pool vault).
    pub async fn get_token_account_balance(&self, account: &Pubkey) -> Result<UiTokenAmount> {
        let result: RpcValue<UiTokenAmount> = self
            .call(
                "getTokenAccountBalance",
                serde_json::json!([account.to_string()]),
            )
            .await?;
        Ok(result.value)
    }

    /// Submits a serialized transaction payload to the chain.
    ///
    /// # Arguments
    ///
    /// * `payload_base64` - Base64-encoded signed transaction
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Transaction signature
    /// * `Err(anyhow::Error)` - Submission rejected or transport failure
    pub async fn send_transaction(&self, payload_base64: &str) -> Result<String> {
        let params = serde_json::json!([
            payload_base64,
            { "encoding": "base64" }
        ]);

        let signature: String = self.call("sendTransaction", params).await?;
        Ok(signature)
    }

    /// Re-reads the governance program accounts for a realm.
    ///
    /// Used after a successful batch execution so the proposal view reflects
    /// the chain's updated execution statuses. The account payloads are
    /// discarded here; repopulating a client-side store is the UI's concern.
    pub async fn refresh_proposal_snapshot(
        &self,
        program_id: &Pubkey,
        realm_id: &Pubkey,
    ) -> Result<()> {
        let params = serde_json::json!([
            program_id.to_string(),
            {
                "encoding": "base64",
                "filters": [
                    { "memcmp": { "offset": 1, "bytes": realm_id.to_string() } }
                ]
            }
        ]);

        let accounts: Vec<serde_json::Value> = self.call("getProgramAccounts", params).await?;
        info!(
            "Refreshed proposal snapshot for realm {}: {} accounts",
            realm_id,
            accounts.len()
        );
        Ok(())
    }

    /// Issues a JSON-RPC call and unwraps the result envelope.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response: JsonRpcResponse<T> = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to call {}", method))?
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", method))?;

        if let Some(error) = response.error {
            return Err(anyhow::anyhow!("RPC error from {}: {}", method, error.message));
        }

        response
            .result
            .with_context(|| format!("Empty result from {}", method))
    }
}
