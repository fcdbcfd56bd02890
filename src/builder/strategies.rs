//! Per-kind builder strategies
//!
//! One strategy per instruction kind: the schema, derivation rules and
//! on-chain construction for that kind, expressed as data plugged into the
//! generic [`InstructionBuilder`](super::InstructionBuilder).

use futures::future::{BoxFuture, FutureExt};
use solana_program::pubkey::Pubkey;

use crate::error::LifecycleError;
use crate::form::{
    AddLiquidityField, AddLiquidityForm, FormRecord, RemoveLiquidityField, RemoveLiquidityForm,
};
use crate::sdk::{
    compute_counter_amount, create_add_liquidity_instruction,
    create_remove_liquidity_instruction, to_base_units, RawInstruction,
};
use crate::validation::Schema;

use super::{ChainServices, InstructionStrategy};

// ============================================================================
// ADD LIQUIDITY
// ============================================================================

/// Strategy for add-liquidity instructions.
///
/// Derives the quote amount from the base amount and slippage via the quote
/// service, and fetches both mint decimals fresh at build time.
pub struct AddLiquidityStrategy;

impl InstructionStrategy for AddLiquidityStrategy {
    type Form = AddLiquidityForm;

    fn schema(&self) -> Schema<AddLiquidityForm> {
        Schema::new()
            .rule("governed_account", |form: &AddLiquidityForm| {
                form.governed_account
                    .is_none()
                    .then(|| "Program governed account is required".to_string())
            })
            .rule("liquidity_pool", |form: &AddLiquidityForm| {
                form.liquidity_pool
                    .is_empty()
                    .then(|| "Liquidity Pool is required".to_string())
            })
            .rule("base_amount_in", |form: &AddLiquidityForm| {
                (form.base_amount_in <= 0.0)
                    .then(|| "Amount for Base token should be more than 0".to_string())
            })
            .rule("quote_amount_in", |form: &AddLiquidityForm| {
                (form.quote_amount_in <= 0.0)
                    .then(|| "Amount for Quote token should be more than 0".to_string())
            })
    }

    fn governed_account(&self, form: &AddLiquidityForm) -> Option<Pubkey> {
        form.governed_account
    }

    fn clear_derived(&self, form: &AddLiquidityForm, changed_field: &str) -> AddLiquidityForm {
        // A new pool prices the deposit differently; the old counter amount
        // must not carry over
        if changed_field == "liquidity_pool" {
            form.with_field(AddLiquidityField::QuoteAmountIn(0.0))
        } else {
            form.clone()
        }
    }

    fn is_derivation_source(&self, changed_field: &str) -> bool {
        matches!(
            changed_field,
            "base_amount_in" | "slippage" | "liquidity_pool"
        )
    }

    fn derive(
        &self,
        services: &ChainServices,
        form: AddLiquidityForm,
    ) -> Option<BoxFuture<'static, anyhow::Result<AddLiquidityForm>>> {
        if form.base_amount_in <= 0.0 || form.liquidity_pool.is_empty() {
            return None;
        }

        let rpc = services.rpc.clone();
        let pools = services.pools.clone();
        Some(
            async move {
                let pool = pools.get(&form.liquidity_pool)?.clone();
                let quote =
                    compute_counter_amount(&rpc, &pool, form.base_amount_in, form.slippage)
                        .await?;
                Ok(form.with_field(AddLiquidityField::QuoteAmountIn(quote)))
            }
            .boxed(),
        )
    }

    fn build(
        &self,
        services: &ChainServices,
        form: AddLiquidityForm,
    ) -> BoxFuture<'static, anyhow::Result<RawInstruction>> {
        let rpc = services.rpc.clone();
        let pools = services.pools.clone();
        async move {
            let governed_account = form
                .governed_account
                .ok_or_else(|| anyhow::anyhow!("Governed account not selected"))?;
            let pool = pools.get(&form.liquidity_pool)?.clone();

            // Decimals are authoritative per mint and fetched at build time,
            // never cached across pools
            let (base_supply, quote_supply) = tokio::try_join!(
                rpc.get_token_supply(&pool.base_mint),
                rpc.get_token_supply(&pool.quote_mint)
            )?;

            create_add_liquidity_instruction(
                &pool,
                to_base_units(form.base_amount_in, base_supply.decimals),
                to_base_units(form.quote_amount_in, quote_supply.decimals),
                form.fixed_side,
                &governed_account,
            )
        }
        .boxed()
    }

    fn lookup_failure_notice(
        &self,
        form: &AddLiquidityForm,
        error: &anyhow::Error,
    ) -> (String, String) {
        match error.downcast_ref::<LifecycleError>() {
            Some(LifecycleError::QuoteFailed { .. }) => (
                "Could not compute quote amount".to_string(),
                format!(
                    "Pool state for {} is unavailable: {}",
                    form.liquidity_pool, error
                ),
            ),
            _ => ("Instruction lookup failed".to_string(), error.to_string()),
        }
    }
}

// ============================================================================
// REMOVE LIQUIDITY
// ============================================================================

/// Strategy for remove-liquidity instructions.
///
/// Probes the governed LP token account when the governance or pool selector
/// changes (so a missing account surfaces as a toast early), and fetches LP
/// mint decimals and balance fresh at build time.
pub struct RemoveLiquidityStrategy;

impl InstructionStrategy for RemoveLiquidityStrategy {
    type Form = RemoveLiquidityForm;

    fn schema(&self) -> Schema<RemoveLiquidityForm> {
        Schema::new()
            .rule("governed_account", |form: &RemoveLiquidityForm| {
                form.governed_account
                    .is_none()
                    .then(|| "Program governed account is required".to_string())
            })
            .rule("liquidity_pool", |form: &RemoveLiquidityForm| {
                form.liquidity_pool
                    .is_empty()
                    .then(|| "Liquidity Pool is required".to_string())
            })
            .rule("amount_in", |form: &RemoveLiquidityForm| {
                (form.amount_in <= 0.0)
                    .then(|| "Amount for LP token should be more than 0".to_string())
            })
    }

    fn governed_account(&self, form: &RemoveLiquidityForm) -> Option<Pubkey> {
        form.governed_account
    }

    fn is_derivation_source(&self, changed_field: &str) -> bool {
        matches!(changed_field, "liquidity_pool" | "governed_account")
    }

    fn derive(
        &self,
        services: &ChainServices,
        form: RemoveLiquidityForm,
    ) -> Option<BoxFuture<'static, anyhow::Result<RemoveLiquidityForm>>> {
        let governed_account = form.governed_account?;
        if form.liquidity_pool.is_empty() {
            return None;
        }

        let rpc = services.rpc.clone();
        let pools = services.pools.clone();
        Some(
            async move {
                let pool = pools.get(&form.liquidity_pool)?.clone();
                // Early probe only: a missing LP account becomes a toast now
                // instead of a surprise at submit time. Build re-fetches.
                rpc.get_token_account_balance_by_owner(&pool.lp_mint, &governed_account)
                    .await?;
                Ok(form)
            }
            .boxed(),
        )
    }

    fn build(
        &self,
        services: &ChainServices,
        form: RemoveLiquidityForm,
    ) -> BoxFuture<'static, anyhow::Result<RawInstruction>> {
        let rpc = services.rpc.clone();
        let pools = services.pools.clone();
        async move {
            let governed_account = form
                .governed_account
                .ok_or_else(|| anyhow::anyhow!("Governed account not selected"))?;
            let pool = pools.get(&form.liquidity_pool)?.clone();

            let lp_info = rpc
                .get_token_account_balance_by_owner(&pool.lp_mint, &governed_account)
                .await?;

            create_remove_liquidity_instruction(
                &pool,
                to_base_units(form.amount_in, lp_info.decimals),
                &governed_account,
            )
        }
        .boxed()
    }

    fn lookup_failure_notice(
        &self,
        form: &RemoveLiquidityForm,
        error: &anyhow::Error,
    ) -> (String, String) {
        match error.downcast_ref::<LifecycleError>() {
            Some(LifecycleError::TokenAccountNotFound { .. }) => (
                "Could not fetch LP Account".to_string(),
                format!(
                    "{} LP Token Account could not be found for the selected Governance",
                    form.liquidity_pool
                ),
            ),
            _ => ("Instruction lookup failed".to_string(), error.to_string()),
        }
    }
}
