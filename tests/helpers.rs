//! Shared test helpers for unit tests
//!
//! This module provides helper functions used by unit tests.
//!
//! The module is organized into several categories:
//! - **Configuration Builders**: Functions to create test configurations
//! - **Service Builders**: Functions to wire ChainServices against a mock RPC
//! - **Default Chain-Data Creators**: Functions to create default proposals
//!   and proposal instructions

use std::sync::Arc;

use solana_program::pubkey::Pubkey;
use tokio::sync::mpsc::UnboundedReceiver;

use proposal_instructions::builder::ChainServices;
use proposal_instructions::config::{BuilderConfig, ChainConfig, Config, ExecutorConfig};
use proposal_instructions::executor::{
    InstructionExecutionStatus, Proposal, ProposalInstruction, ProposalState,
};
use proposal_instructions::notify::{Notification, Notifier};
use proposal_instructions::rpc_client::RpcClient;
use proposal_instructions::sdk::{
    create_remove_liquidity_instruction, serialize_instruction, PoolRegistry,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Governance program id used across test configs (valid base58)
pub const DUMMY_PROGRAM_ID: &str = "GovER5Lthms3bLBqWub97yVrMmEogzX7xNjdXpPPCVZw";

/// Realm id used across test configs (valid base58)
pub const DUMMY_REALM_ID: &str = "11111111111111111111111111111111";

/// Pool label guaranteed to exist in the default pool registry
pub const DUMMY_POOL: &str = "SOL-USDC";

/// Pool label guaranteed to NOT exist in the default pool registry
#[allow(dead_code)]
pub const DUMMY_UNKNOWN_POOL: &str = "FOO-BAR";

/// Short debounce window so tests settle quickly (milliseconds)
pub const TEST_DEBOUNCE_MS: u64 = 50;

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

/// Build a valid in-memory test configuration pointing at the given RPC URL.
/// Timing knobs are shortened so debounce/poll tests settle quickly.
#[allow(dead_code)]
pub fn build_test_config(rpc_url: &str) -> Config {
    Config {
        chain: ChainConfig {
            name: "testnet".to_string(),
            rpc_url: rpc_url.to_string(),
            program_id: DUMMY_PROGRAM_ID.to_string(),
            realm_id: DUMMY_REALM_ID.to_string(),
        },
        builder: BuilderConfig {
            debounce_ms: TEST_DEBOUNCE_MS,
            validation_timeout_ms: 1000,
        },
        executor: ExecutorConfig {
            slot_poll_interval_ms: 50,
        },
    }
}

// ============================================================================
// SERVICE BUILDERS
// ============================================================================

/// Wire ChainServices against the given RPC URL (usually a wiremock server).
///
/// Returns the services plus the notification receiver so tests can assert
/// which toasts the core pushed.
#[allow(dead_code)]
pub fn build_test_services(rpc_url: &str) -> (ChainServices, UnboundedReceiver<Notification>) {
    let (notifier, notifications) = Notifier::channel();
    let services = ChainServices {
        rpc: Arc::new(RpcClient::new(rpc_url).expect("Failed to create RPC client")),
        pools: Arc::new(PoolRegistry::default_pools()),
        notifier,
    };
    (services, notifications)
}

// ============================================================================
// DEFAULT CHAIN-DATA CREATORS
// ============================================================================

/// Create a proposal in the given state.
/// This can be customized using Rust's struct update syntax:
/// ```
/// let proposal = create_proposal(ProposalState::Executing, Some(1000));
/// let custom = Proposal { state: ProposalState::Voting, ..proposal };
/// ```
#[allow(dead_code)]
pub fn create_proposal(state: ProposalState, voting_completed_at: Option<u64>) -> Proposal {
    Proposal {
        address: Pubkey::new_unique().to_string(),
        state,
        voting_completed_at,
    }
}

/// Create a proposal instruction with a real decodable payload.
///
/// The payload is a remove-liquidity instruction against the default pool
/// registry, so batch submission tests exercise the full decode path.
#[allow(dead_code)]
pub fn create_proposal_instruction(
    index: usize,
    execution_status: InstructionExecutionStatus,
) -> ProposalInstruction {
    let pools = PoolRegistry::default_pools();
    let pool = pools.get(DUMMY_POOL).expect("default pool exists");
    let raw = create_remove_liquidity_instruction(pool, 1_000_000, &Pubkey::new_unique())
        .expect("instruction construction succeeds");

    ProposalInstruction {
        index,
        serialized_instruction: serialize_instruction(&raw)
            .expect("instruction serialization succeeds"),
        execution_status,
    }
}
