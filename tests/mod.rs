//! Test module organization
//!
//! This module re-exports test helpers for use in test files.

mod helpers;
mod helpers_mock_rpc;

#[allow(unused_imports)]
pub use helpers::{
    build_test_config, build_test_services, create_proposal, create_proposal_instruction,
    DUMMY_POOL, DUMMY_PROGRAM_ID, DUMMY_REALM_ID, DUMMY_UNKNOWN_POOL, TEST_DEBOUNCE_MS,
};

#[allow(unused_imports)]
pub use helpers_mock_rpc::{
    mock_get_program_accounts, mock_get_slot, mock_get_token_account_balance,
    mock_no_token_accounts, mock_send_transaction_failure, mock_send_transaction_success,
    mock_token_accounts_by_owner, mock_token_supply,
};
