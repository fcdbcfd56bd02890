//! Proposal Instruction Lifecycle Library
//!
//! This crate implements the instruction lifecycle for a DAO governance
//! front-end: turning user-entered, asynchronously-validated form state into
//! deterministic, serializable on-chain instruction payloads, and driving
//! execution of a finalized proposal's approved instruction batch against
//! the chain.
//!
//! Two cores:
//! 1. The instruction builder protocol - debounced async validation,
//!    deterministic serialization, registration with the shared aggregator.
//! 2. The execution controller - a play-state machine that decides when
//!    instructions are executable, submits the batch, polls chain time and
//!    reconciles partial failure via per-instruction statuses.
//!
//! Rendering, wallet signing and chain consensus are external collaborators;
//! the chain is consumed as a service exposing current slot, transaction
//! submission and per-instruction execution status.

pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
pub mod form;
pub mod notify;
pub mod rpc_client;
pub mod sdk;
pub mod validation;

// Re-export commonly used types
pub use builder::{
    ChainServices, InstructionAggregator, InstructionBuilder, InstructionStrategy,
    RegisteredEntry, UiInstruction,
};
pub use config::{BuilderConfig, ChainConfig, Config, ExecutorConfig};
pub use error::LifecycleError;
pub use executor::{
    ExecutionController, ExecutionView, InstructionExecutionStatus, PlayState, Proposal,
    ProposalInstruction, ProposalState,
};
pub use form::{AddLiquidityForm, FormRecord, RemoveLiquidityForm};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use validation::{Debouncer, Generation, Schema, ValidationResult};
