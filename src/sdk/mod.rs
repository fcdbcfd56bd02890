//! Instruction SDK Adapter
//!
//! Pool registry, AMM instruction construction and payload serialization.
//! This is the boundary to the external AMM SDK: pool key math and swap
//! routing stay outside, this module only knows how to turn validated form
//! values plus fresh mint metadata into a deterministic, transport-safe
//! instruction payload.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::LifecycleError;
use crate::form::FixedSide;
use crate::rpc_client::RpcClient;

/// AMM program all registry pools belong to (Raydium liquidity pool v4).
pub const AMM_PROGRAM_ID: &str = "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8";

/// SPL token program, required in every liquidity instruction account list.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

// ============================================================================
// POOL REGISTRY
// ============================================================================

/// On-chain addresses for one AMM liquidity pool.
#[derive(Debug, Clone)]
pub struct PoolKeys {
    /// Human-readable pool label shown in the pool selector
    pub label: String,
    /// AMM pool state account
    pub amm_id: Pubkey,
    /// AMM authority PDA
    pub amm_authority: Pubkey,
    /// Base token mint
    pub base_mint: Pubkey,
    /// Quote token mint
    pub quote_mint: Pubkey,
    /// LP token mint
    pub lp_mint: Pubkey,
    /// Pool vault holding the base token
    pub base_vault: Pubkey,
    /// Pool vault holding the quote token
    pub quote_vault: Pubkey,
}

/// Registry of pools the form's pool selector offers.
///
/// Keyed by label; lookup failures surface as `LifecycleError::UnknownPool`.
pub struct PoolRegistry {
    pools: BTreeMap<String, PoolKeys>,
}

impl PoolRegistry {
    /// Builds a registry from an explicit pool list.
    pub fn with_pools(pools: Vec<PoolKeys>) -> Self {
        Self {
            pools: pools
                .into_iter()
                .map(|keys| (keys.label.clone(), keys))
                .collect(),
        }
    }

    /// Registry with the built-in pool list.
    ///
    /// Pool state addresses are derived deterministically from the label so
    /// the registry is self-contained; deployments targeting mainnet replace
    /// this with the published pool list.
    pub fn default_pools() -> Self {
        let labels = [
            ("SOL-USDC", "So11111111111111111111111111111111111111112",
             "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            ("RAY-USDC", "4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R",
             "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            ("RAY-SOL", "4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R",
             "So11111111111111111111111111111111111111112"),
            ("USDT-USDC", "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
             "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
        ];

        let amm_program = Pubkey::from_str(AMM_PROGRAM_ID).expect("valid AMM program id");

        let pools = labels
            .iter()
            .map(|(label, base_mint, quote_mint)| {
                let derive = |tag: &[u8]| {
                    Pubkey::find_program_address(&[tag, label.as_bytes()], &amm_program).0
                };
                PoolKeys {
                    label: label.to_string(),
                    amm_id: derive(b"amm"),
                    amm_authority: derive(b"authority"),
                    base_mint: Pubkey::from_str(base_mint).expect("valid base mint"),
                    quote_mint: Pubkey::from_str(quote_mint).expect("valid quote mint"),
                    lp_mint: derive(b"lp_mint"),
                    base_vault: derive(b"base_vault"),
                    quote_vault: derive(b"quote_vault"),
                }
            })
            .collect();

        Self::with_pools(pools)
    }

    /// Looks up a pool by label.
    ///
    /// # Returns
    ///
    /// * `Ok(&PoolKeys)` - Pool is registered
    /// * `Err(LifecycleError::UnknownPool)` - No pool with that label
    pub fn get(&self, label: &str) -> Result<&PoolKeys> {
        self.pools
            .get(label)
            .ok_or_else(|| anyhow::Error::new(LifecycleError::UnknownPool(label.to_string())))
    }

    /// Labels for the pool selector, in stable order.
    pub fn labels(&self) -> Vec<String> {
        self.pools.keys().cloned().collect()
    }
}

// ============================================================================
// INSTRUCTION STRUCTURES
// ============================================================================

/// One account reference in an instruction's account list.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct InstructionAccount {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// A fully constructed on-chain instruction, ready for serialization.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct RawInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<InstructionAccount>,
    pub data: Vec<u8>,
}

/// AMM deposit instruction data layout.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
struct DepositData {
    /// Instruction tag (3 = deposit)
    instruction: u8,
    max_base_amount: u64,
    max_quote_amount: u64,
    /// 0 = base side fixed, 1 = quote side fixed
    fixed_side: u64,
}

/// AMM withdraw instruction data layout.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
struct WithdrawData {
    /// Instruction tag (4 = withdraw)
    instruction: u8,
    lp_amount: u64,
}

// ============================================================================
// AMOUNT CONVERSION
// ============================================================================

/// Converts a human-decimal amount to integer base units.
///
/// Uses the mint decimals fetched at build time: amount x 10^decimals,
/// rounded to the nearest base unit. Fractional remainders below one base
/// unit are dropped.
pub fn to_base_units(decimal_amount: f64, decimals: u8) -> u64 {
    let shifted = decimal_amount * 10f64.powi(decimals as i32);
    if shifted <= 0.0 {
        return 0;
    }
    shifted.round() as u64
}

// ============================================================================
// INSTRUCTION CONSTRUCTION
// ============================================================================

/// Builds an add-liquidity (deposit) instruction.
///
/// # Arguments
///
/// * `pool` - Pool the deposit targets
/// * `max_base_amount` - Base token amount in base units
/// * `max_quote_amount` - Quote token amount in base units
/// * `fixed_side` - Which side is fixed; the AMM adjusts the other
/// * `governed_account` - Governance authority that signs the deposit
pub fn create_add_liquidity_instruction(
    pool: &PoolKeys,
    max_base_amount: u64,
    max_quote_amount: u64,
    fixed_side: FixedSide,
    governed_account: &Pubkey,
) -> Result<RawInstruction> {
    let data = DepositData {
        instruction: 3,
        max_base_amount,
        max_quote_amount,
        fixed_side: fixed_side.as_u64(),
    };

    Ok(RawInstruction {
        program_id: Pubkey::from_str(AMM_PROGRAM_ID).context("Invalid AMM program id")?,
        accounts: vec![
            account(TOKEN_PROGRAM_ID.parse().context("Invalid token program id")?, false, false),
            account(pool.amm_id, false, true),
            account(pool.amm_authority, false, false),
            account(pool.lp_mint, false, true),
            account(pool.base_vault, false, true),
            account(pool.quote_vault, false, true),
            account(*governed_account, true, true),
        ],
        data: borsh::to_vec(&data).context("Failed to serialize deposit data")?,
    })
}

/// Builds a remove-liquidity (withdraw) instruction.
///
/// # Arguments
///
/// * `pool` - Pool the withdrawal targets
/// * `lp_amount` - LP token amount to burn, in base units
/// * `governed_account` - Governance authority holding the LP tokens
pub fn create_remove_liquidity_instruction(
    pool: &PoolKeys,
    lp_amount: u64,
    governed_account: &Pubkey,
) -> Result<RawInstruction> {
    let data = WithdrawData {
        instruction: 4,
        lp_amount,
    };

    Ok(RawInstruction {
        program_id: Pubkey::from_str(AMM_PROGRAM_ID).context("Invalid AMM program id")?,
        accounts: vec![
            account(TOKEN_PROGRAM_ID.parse().context("Invalid token program id")?, false, false),
            account(pool.amm_id, false, true),
            account(pool.amm_authority, false, false),
            account(pool.lp_mint, false, true),
            account(pool.base_vault, false, true),
            account(pool.quote_vault, false, true),
            account(*governed_account, true, true),
        ],
        data: borsh::to_vec(&data).context("Failed to serialize withdraw data")?,
    })
}

fn account(pubkey: Pubkey, is_signer: bool, is_writable: bool) -> InstructionAccount {
    InstructionAccount {
        pubkey,
        is_signer,
        is_writable,
    }
}

// ============================================================================
// SERIALIZATION
// ============================================================================

/// Serializes an instruction to the opaque transport payload format.
///
/// Deterministic: the same instruction always yields a byte-identical
/// base64 string, which is what makes repeated builds of an unchanged form
/// idempotent.
pub fn serialize_instruction(instruction: &RawInstruction) -> Result<String> {
    let bytes = borsh::to_vec(instruction).context("Failed to serialize instruction")?;
    Ok(STANDARD.encode(bytes))
}

/// Decodes a transport payload back into an instruction.
///
/// Used by the proposal-creation flow when inspecting registered entries.
pub fn deserialize_instruction(payload: &str) -> Result<RawInstruction> {
    let bytes = STANDARD
        .decode(payload)
        .context("Invalid base64 instruction payload")?;
    RawInstruction::try_from_slice(&bytes).context("Invalid instruction payload bytes")
}

// ============================================================================
// QUOTE COMPUTATION
// ============================================================================

/// Computes the counter amount for a deposit from live pool vault balances.
///
/// Quote/Derivation Service: given a fixed base amount and a slippage
/// tolerance, returns the quote amount the pool currently prices it at,
/// reduced by the slippage buffer.
///
/// # Returns
///
/// * `Ok(f64)` - Counter amount in decimal units
/// * `Err(LifecycleError::QuoteFailed)` - Base vault is empty or pool state
///   is unavailable
pub async fn compute_counter_amount(
    rpc: &RpcClient,
    pool: &PoolKeys,
    amount: f64,
    slippage_pct: f64,
) -> Result<f64> {
    let base_balance = rpc
        .get_token_account_balance(&pool.base_vault)
        .await
        .map_err(|e| {
            anyhow::Error::new(LifecycleError::QuoteFailed {
                pool: pool.label.clone(),
                reason: e.to_string(),
            })
        })?;
    let quote_balance = rpc
        .get_token_account_balance(&pool.quote_vault)
        .await
        .map_err(|e| {
            anyhow::Error::new(LifecycleError::QuoteFailed {
                pool: pool.label.clone(),
                reason: e.to_string(),
            })
        })?;

    if base_balance.ui_amount <= 0.0 {
        return Err(anyhow::Error::new(LifecycleError::QuoteFailed {
            pool: pool.label.clone(),
            reason: "base vault is empty".to_string(),
        }));
    }

    let price = quote_balance.ui_amount / base_balance.ui_amount;
    Ok(amount * price * (1.0 - slippage_pct / 100.0))
}
