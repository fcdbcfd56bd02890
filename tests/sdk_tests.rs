//! Unit tests for the instruction SDK adapter
//!
//! Covers amount conversion, pool registry lookups, payload serialization
//! and quote computation.

use solana_program::pubkey::Pubkey;
use wiremock::MockServer;

use proposal_instructions::error::LifecycleError;
use proposal_instructions::form::FixedSide;
use proposal_instructions::rpc_client::RpcClient;
use proposal_instructions::sdk::{
    compute_counter_amount, create_add_liquidity_instruction, deserialize_instruction,
    serialize_instruction, to_base_units, PoolRegistry,
};

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{
    mock_get_token_account_balance, DUMMY_POOL, DUMMY_UNKNOWN_POOL,
};

// ============================================================================
// AMOUNT CONVERSION TESTS
// ============================================================================

/// Test decimal-to-base-unit conversion across decimals
/// Why: The shift uses the mint's own decimals, so the same human amount
/// maps to different integers per mint
#[test]
fn test_to_base_units_shifts_by_decimals() {
    assert_eq!(to_base_units(100.0, 6), 100_000_000);
    assert_eq!(to_base_units(100.0, 9), 100_000_000_000);
    assert_eq!(to_base_units(0.5, 6), 500_000);
}

/// Test that conversion rounds to the nearest base unit
#[test]
fn test_to_base_units_rounds() {
    // 0.1 is not exactly representable; rounding absorbs the float error
    assert_eq!(to_base_units(0.1, 6), 100_000);
    assert_eq!(to_base_units(1.0000004, 6), 1_000_000);
    assert_eq!(to_base_units(1.0000006, 6), 1_000_001);
}

/// Test that zero and negative amounts convert to zero
#[test]
fn test_to_base_units_clamps_non_positive() {
    assert_eq!(to_base_units(0.0, 6), 0);
    assert_eq!(to_base_units(-5.0, 6), 0);
}

// ============================================================================
// POOL REGISTRY TESTS
// ============================================================================

/// Test that the built-in registry resolves its own labels
#[test]
fn test_default_pools_resolve() {
    let pools = PoolRegistry::default_pools();
    for label in pools.labels() {
        assert!(pools.get(&label).is_ok());
    }
    assert!(pools.get(DUMMY_POOL).is_ok());
}

/// Test that an unknown label yields the typed unknown-pool error
/// Why: Callers downcast this variant to distinguish a bad selection from
/// a transport failure
#[test]
fn test_unknown_pool_is_typed_error() {
    let pools = PoolRegistry::default_pools();
    let error = pools.get(DUMMY_UNKNOWN_POOL).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::UnknownPool(label)) if label == DUMMY_UNKNOWN_POOL
    ));
}

// ============================================================================
// SERIALIZATION TESTS
// ============================================================================

/// Test that serialization is deterministic and decodes back to the same
/// instruction
/// Why: Idempotent rebuilds of an unchanged form rely on byte-identical
/// payloads
#[test]
fn test_serialization_is_deterministic() {
    let pools = PoolRegistry::default_pools();
    let pool = pools.get(DUMMY_POOL).expect("default pool exists");
    let governed = Pubkey::new_unique();

    let raw = create_add_liquidity_instruction(pool, 1_000_000, 2_000_000, FixedSide::Base, &governed)
        .expect("instruction builds");

    let first = serialize_instruction(&raw).expect("serializes");
    let second = serialize_instruction(&raw).expect("serializes");
    assert_eq!(first, second);

    let decoded = deserialize_instruction(&first).expect("decodes");
    assert_eq!(decoded, raw);
}

/// Test that a garbage payload fails to decode with an error, not a panic
#[test]
fn test_deserialize_rejects_garbage() {
    assert!(deserialize_instruction("????").is_err());
    assert!(deserialize_instruction("AQID").is_err());
}

// ============================================================================
// QUOTE COMPUTATION TESTS
// ============================================================================

/// Test the quote formula: amount x vault price, reduced by the slippage
/// buffer
#[tokio::test]
async fn test_compute_counter_amount_applies_slippage() {
    let server = MockServer::start().await;
    // Both vaults respond with the same balance, pricing the pool at 1:1
    mock_get_token_account_balance(&server, 500.0, 6).await;
    let rpc = RpcClient::new(&server.uri()).expect("client builds");

    let pools = PoolRegistry::default_pools();
    let pool = pools.get(DUMMY_POOL).expect("default pool exists");

    let quote = compute_counter_amount(&rpc, pool, 100.0, 1.0)
        .await
        .expect("quote computes");
    assert!((quote - 99.0).abs() < 1e-9);
}

/// Test that an empty base vault yields the typed quote failure
/// Why: Division by a zero balance must become a recoverable error
#[tokio::test]
async fn test_compute_counter_amount_empty_base_vault() {
    let server = MockServer::start().await;
    mock_get_token_account_balance(&server, 0.0, 6).await;
    let rpc = RpcClient::new(&server.uri()).expect("client builds");

    let pools = PoolRegistry::default_pools();
    let pool = pools.get(DUMMY_POOL).expect("default pool exists");

    let error = compute_counter_amount(&rpc, pool, 100.0, 1.0)
        .await
        .unwrap_err();
    assert!(matches!(
        error.downcast_ref::<LifecycleError>(),
        Some(LifecycleError::QuoteFailed { .. })
    ));
}
