//! Form Model
//!
//! Plain versioned records of user input, one per instruction kind. Records
//! carry no behavior beyond storage and replacement-on-change: every edit
//! produces a brand-new record via a typed field patch, there is no partial
//! mutation. Amounts are stored in human-readable decimal units; conversion
//! to on-chain integer units happens only at build time.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

// ============================================================================
// FORM RECORD TRAIT
// ============================================================================

/// A form record that is replaced wholesale on each edit.
///
/// `Patch` is a typed single-field replacement: one variant per field,
/// carrying the new value.
pub trait FormRecord: Clone + Send + Sync + 'static {
    /// Typed single-field replacement
    type Patch: Send;

    /// Returns a new record with the patched field replaced.
    fn with_field(&self, patch: Self::Patch) -> Self;

    /// Name of the field a patch targets (matches validation error keys).
    fn field_name(patch: &Self::Patch) -> &'static str;
}

// ============================================================================
// SHARED FIELD TYPES
// ============================================================================

/// Which side of an add-liquidity deposit is fixed.
///
/// The other side is derived from pool state at quote time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixedSide {
    /// The base token amount is fixed
    Base,
    /// The quote token amount is fixed
    Quote,
}

impl FixedSide {
    /// Encoding used in the on-chain deposit instruction data.
    pub fn as_u64(self) -> u64 {
        match self {
            FixedSide::Base => 0,
            FixedSide::Quote => 1,
        }
    }
}

// ============================================================================
// ADD LIQUIDITY
// ============================================================================

/// User input for an add-liquidity instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLiquidityForm {
    /// Governance-controlled account authorized to move the funds
    /// (None until selected)
    pub governed_account: Option<Pubkey>,
    /// Pool label in the pool registry (empty until selected)
    pub liquidity_pool: String,
    /// Base token amount to deposit, decimal units
    pub base_amount_in: f64,
    /// Quote token amount to deposit, decimal units. Derived from
    /// `base_amount_in` via the quote service; cleared when the pool changes.
    pub quote_amount_in: f64,
    /// Which side of the deposit is fixed
    pub fixed_side: FixedSide,
    /// Slippage tolerance in percent
    pub slippage: f64,
}

impl Default for AddLiquidityForm {
    fn default() -> Self {
        Self {
            governed_account: None,
            liquidity_pool: String::new(),
            base_amount_in: 0.0,
            quote_amount_in: 0.0,
            fixed_side: FixedSide::Base,
            slippage: 0.5,
        }
    }
}

/// Single-field replacement for [`AddLiquidityForm`].
#[derive(Debug, Clone)]
pub enum AddLiquidityField {
    GovernedAccount(Option<Pubkey>),
    LiquidityPool(String),
    BaseAmountIn(f64),
    QuoteAmountIn(f64),
    FixedSide(FixedSide),
    Slippage(f64),
}

impl FormRecord for AddLiquidityForm {
    type Patch = AddLiquidityField;

    fn with_field(&self, patch: AddLiquidityField) -> Self {
        let mut next = self.clone();
        match patch {
            AddLiquidityField::GovernedAccount(value) => next.governed_account = value,
            AddLiquidityField::LiquidityPool(value) => next.liquidity_pool = value,
            AddLiquidityField::BaseAmountIn(value) => next.base_amount_in = value,
            AddLiquidityField::QuoteAmountIn(value) => next.quote_amount_in = value,
            AddLiquidityField::FixedSide(value) => next.fixed_side = value,
            AddLiquidityField::Slippage(value) => next.slippage = value,
        }
        next
    }

    fn field_name(patch: &AddLiquidityField) -> &'static str {
        match patch {
            AddLiquidityField::GovernedAccount(_) => "governed_account",
            AddLiquidityField::LiquidityPool(_) => "liquidity_pool",
            AddLiquidityField::BaseAmountIn(_) => "base_amount_in",
            AddLiquidityField::QuoteAmountIn(_) => "quote_amount_in",
            AddLiquidityField::FixedSide(_) => "fixed_side",
            AddLiquidityField::Slippage(_) => "slippage",
        }
    }
}

// ============================================================================
// REMOVE LIQUIDITY
// ============================================================================

/// User input for a remove-liquidity instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveLiquidityForm {
    /// Governance-controlled account holding the LP tokens (None until
    /// selected)
    pub governed_account: Option<Pubkey>,
    /// Pool label in the pool registry (empty until selected)
    pub liquidity_pool: String,
    /// LP token amount to withdraw, decimal units
    pub amount_in: f64,
}

impl Default for RemoveLiquidityForm {
    fn default() -> Self {
        Self {
            governed_account: None,
            liquidity_pool: String::new(),
            amount_in: 0.0,
        }
    }
}

/// Single-field replacement for [`RemoveLiquidityForm`].
#[derive(Debug, Clone)]
pub enum RemoveLiquidityField {
    GovernedAccount(Option<Pubkey>),
    LiquidityPool(String),
    AmountIn(f64),
}

impl FormRecord for RemoveLiquidityForm {
    type Patch = RemoveLiquidityField;

    fn with_field(&self, patch: RemoveLiquidityField) -> Self {
        let mut next = self.clone();
        match patch {
            RemoveLiquidityField::GovernedAccount(value) => next.governed_account = value,
            RemoveLiquidityField::LiquidityPool(value) => next.liquidity_pool = value,
            RemoveLiquidityField::AmountIn(value) => next.amount_in = value,
        }
        next
    }

    fn field_name(patch: &RemoveLiquidityField) -> &'static str {
        match patch {
            RemoveLiquidityField::GovernedAccount(_) => "governed_account",
            RemoveLiquidityField::LiquidityPool(_) => "liquidity_pool",
            RemoveLiquidityField::AmountIn(_) => "amount_in",
        }
    }
}
