//! Execution Controller
//!
//! Drives on-chain execution of a finalized proposal's approved instruction
//! set. Tracks a per-proposal play state, decides which action the UI should
//! offer from chain-side facts (proposal state, per-instruction execution
//! status, slot window), submits the batch as one logical unit, and polls
//! chain time to gate retries. All failures are converted to state and
//! logged; nothing propagates as an unhandled fault into the proposal view.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use borsh::BorshDeserialize;
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::LifecycleError;
use crate::rpc_client::RpcClient;
use crate::sdk::RawInstruction;

// ============================================================================
// CHAIN-SIDE DATA STRUCTURES
// ============================================================================

/// Governance proposal lifecycle state, as stored on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    Draft,
    SigningOff,
    Voting,
    Succeeded,
    Executing,
    Completed,
    Cancelled,
    Defeated,
    ExecutingWithErrors,
    Vetoed,
}

/// Per-instruction execution status, mutated only by the chain itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionExecutionStatus {
    /// Not executed yet
    None,
    /// Executed successfully
    Success,
    /// Execution faulted
    Error,
}

/// One instruction attached to a finalized proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalInstruction {
    /// Position within the proposal's ordered instruction set
    pub index: usize,
    /// Base64 instruction payload (as produced by the builder)
    pub serialized_instruction: String,
    /// Current execution status read from the chain
    pub execution_status: InstructionExecutionStatus,
}

/// The slice of a proposal the controller needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal account address (base58)
    pub address: String,
    /// Current lifecycle state
    pub state: ProposalState,
    /// Slot at which voting completed (None while voting is open)
    pub voting_completed_at: Option<u64>,
}

// ============================================================================
// CLIENT-LOCAL STATE
// ============================================================================

/// Client-local, volatile play state for one proposal's execution.
///
/// Created when the execution view mounts, reset on remount, never
/// persisted. Transitions are driven only by user invocation and the
/// outcome of the batch execution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    Unplayed,
    Playing,
    Played,
    Error,
}

/// What the surrounding UI should render for the execution control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionView {
    /// Static "executed" indicator; terminal
    Executed,
    /// Render nothing (not executable in this state or window)
    Hidden,
    /// Primary execute action
    Execute,
    /// In-progress indicator
    InProgress,
    /// Retry action after a failure
    Retry,
}

// ============================================================================
// ELIGIBILITY
// ============================================================================

/// First slot at which execution is no longer eligible.
///
/// Execution windows are chain-time-bounded: the set is executable up to and
/// including `voting_completed_at`, i.e. strictly before this slot.
pub fn can_execute_at(proposal: &Proposal) -> u64 {
    proposal
        .voting_completed_at
        .map(|slot| slot + 1)
        .unwrap_or(0)
}

/// True once the current slot has passed the proposal's eligible window.
pub fn is_passed_execution_slot(proposal: &Proposal, current_slot: u64) -> bool {
    current_slot >= can_execute_at(proposal)
}

/// Derives the render state for the execution control.
///
/// Pure function of { play state, proposal state, slot window,
/// per-instruction statuses }; the decision ladder is ordered, first match
/// wins:
///
/// 1. every instruction already Success -> Executed (terminal, regardless of
///    play state)
/// 2. proposal not in an executable state -> Hidden
/// 3. execution window passed -> Hidden (governance's own failure path takes
///    over; no client-side replay)
/// 4. Unplayed and no instruction in Error -> Execute
/// 5. Playing -> InProgress
/// 6. Error play state, or no instruction in Error -> Retry
/// 7. otherwise -> Executed
pub fn render_state(
    play_state: PlayState,
    proposal: &Proposal,
    instructions: &[ProposalInstruction],
    current_slot: u64,
) -> ExecutionView {
    if instructions
        .iter()
        .all(|ix| ix.execution_status == InstructionExecutionStatus::Success)
    {
        return ExecutionView::Executed;
    }

    if proposal.state != ProposalState::Executing
        && proposal.state != ProposalState::ExecutingWithErrors
        && proposal.state != ProposalState::Succeeded
    {
        return ExecutionView::Hidden;
    }

    if is_passed_execution_slot(proposal, current_slot) {
        return ExecutionView::Hidden;
    }

    if play_state == PlayState::Unplayed
        && instructions
            .iter()
            .all(|ix| ix.execution_status != InstructionExecutionStatus::Error)
    {
        return ExecutionView::Execute;
    }

    if play_state == PlayState::Playing {
        return ExecutionView::InProgress;
    }

    if play_state == PlayState::Error
        || instructions
            .iter()
            .all(|ix| ix.execution_status != InstructionExecutionStatus::Error)
    {
        return ExecutionView::Retry;
    }

    ExecutionView::Executed
}

// ============================================================================
// EXECUTION CONTROLLER
// ============================================================================

/// Per-proposal execution state machine.
pub struct ExecutionController {
    rpc: Arc<RpcClient>,
    program_id: Pubkey,
    realm_id: Pubkey,
    poll_interval: Duration,
    play_state: Arc<RwLock<PlayState>>,
    /// Last slot observed from the chain (0 until the first poll lands)
    current_slot: Arc<AtomicU64>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl ExecutionController {
    /// Creates a controller for one proposal view.
    ///
    /// # Arguments
    ///
    /// * `config` - Lifecycle configuration (program/realm ids, poll interval)
    /// * `rpc` - Chain query client
    pub fn new(config: &Config, rpc: Arc<RpcClient>) -> Result<Self> {
        let program_id = Pubkey::from_str(&config.chain.program_id)
            .context("Invalid governance program id in config")?;
        let realm_id =
            Pubkey::from_str(&config.chain.realm_id).context("Invalid realm id in config")?;

        Ok(Self {
            rpc,
            program_id,
            realm_id,
            poll_interval: Duration::from_millis(config.executor.slot_poll_interval_ms),
            play_state: Arc::new(RwLock::new(PlayState::Unplayed)),
            current_slot: Arc::new(AtomicU64::new(0)),
            poller: Mutex::new(None),
        })
    }

    /// Current play state.
    pub async fn play_state(&self) -> PlayState {
        *self.play_state.read().await
    }

    /// Resets to the mount state (the view was torn down and remounted).
    pub async fn reset(&self) {
        *self.play_state.write().await = PlayState::Unplayed;
    }

    /// Last slot observed from the chain.
    pub fn last_observed_slot(&self) -> u64 {
        self.current_slot.load(Ordering::SeqCst)
    }

    /// Records an externally observed slot (initial page load fetch).
    pub fn note_slot(&self, slot: u64) {
        self.current_slot.store(slot, Ordering::SeqCst);
    }

    /// Render state for the UI given the latest chain facts.
    pub async fn view(
        &self,
        proposal: &Proposal,
        instructions: &[ProposalInstruction],
    ) -> ExecutionView {
        render_state(
            self.play_state().await,
            proposal,
            instructions,
            self.last_observed_slot(),
        )
    }

    /// Executes the proposal's full instruction set as one logical unit.
    ///
    /// Only proceeds when the derived view currently offers Execute or Retry;
    /// anything else is a precondition failure and is silently suppressed
    /// (no action is rendered for it either). On success the proposal
    /// snapshot is refreshed and the state becomes Played; on failure the
    /// fault is logged and the state becomes Error. Nothing is re-thrown.
    pub async fn execute_all(
        &self,
        proposal: &Proposal,
        instructions: &[ProposalInstruction],
    ) -> PlayState {
        let view = self.view(proposal, instructions).await;
        if view != ExecutionView::Execute && view != ExecutionView::Retry {
            info!(
                "Execution not offered for proposal {} (view {:?}), ignoring invoke",
                proposal.address, view
            );
            return self.play_state().await;
        }

        *self.play_state.write().await = PlayState::Playing;

        match self.submit_batch(instructions).await {
            Ok(signature) => {
                info!(
                    "Executed instruction batch for proposal {}: {}",
                    proposal.address, signature
                );
                if let Err(e) = self
                    .rpc
                    .refresh_proposal_snapshot(&self.program_id, &self.realm_id)
                    .await
                {
                    warn!("Proposal snapshot refresh failed: {}", e);
                }
                *self.play_state.write().await = PlayState::Played;
            }
            Err(e) => {
                error!(
                    "Error executing instruction batch for proposal {}: {}",
                    proposal.address, e
                );
                *self.play_state.write().await = PlayState::Error;
            }
        }

        self.play_state().await
    }

    /// Submits the ordered instruction set as a single transaction payload.
    ///
    /// Atomic at the client level: the call either fully succeeds or is
    /// treated as failed. Partial failure reconciliation is delegated to
    /// subsequent reads of each instruction's execution status.
    async fn submit_batch(&self, instructions: &[ProposalInstruction]) -> Result<String> {
        let payload = batch_payload(instructions)?;
        self.rpc
            .send_transaction(&payload)
            .await
            .map_err(|e| anyhow::Error::new(LifecycleError::SubmissionFailed(e.to_string())))
    }

    /// Starts polling the chain for the current slot.
    ///
    /// Cancels any pending poll first, so calling this again when watched
    /// inputs change (connection handle, eligibility) never leaves orphaned
    /// timers behind. The loop stops on its own once the observed slot
    /// passes `can_execute_at` - past that point the window is closed and
    /// the view is Hidden regardless.
    pub fn start_slot_polling(&self, can_execute_at: u64) {
        self.stop_slot_polling();

        let rpc = self.rpc.clone();
        let current_slot = self.current_slot.clone();
        let interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match rpc.get_slot().await {
                    Ok(slot) => {
                        current_slot.store(slot, Ordering::SeqCst);
                        if slot >= can_execute_at {
                            info!("Execution window closed at slot {}", slot);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Slot poll failed: {}", e);
                    }
                }
            }
        });

        let mut poller = self.poller.lock().expect("poller lock poisoned");
        *poller = Some(handle);
    }

    /// Cancels the pending slot poll. The poll never fires after this.
    pub fn stop_slot_polling(&self) {
        let mut poller = self.poller.lock().expect("poller lock poisoned");
        if let Some(handle) = poller.take() {
            handle.abort();
        }
    }
}

impl Drop for ExecutionController {
    fn drop(&mut self) {
        self.stop_slot_polling();
    }
}

// ============================================================================
// BATCH PAYLOAD
// ============================================================================

/// Packs the ordered instruction set into one base64 transaction payload.
///
/// # Returns
///
/// * `Ok(String)` - Borsh-serialized instruction vector, base64-encoded
/// * `Err(anyhow::Error)` - The set is empty or a payload fails to decode
pub fn batch_payload(instructions: &[ProposalInstruction]) -> Result<String> {
    if instructions.is_empty() {
        anyhow::bail!("Instruction set is empty");
    }

    let mut ordered = instructions.to_vec();
    ordered.sort_by_key(|ix| ix.index);

    let mut raw: Vec<RawInstruction> = Vec::with_capacity(ordered.len());
    for instruction in &ordered {
        let bytes = STANDARD
            .decode(&instruction.serialized_instruction)
            .with_context(|| {
                format!(
                    "Invalid base64 payload for instruction {}",
                    instruction.index
                )
            })?;
        let decoded = RawInstruction::try_from_slice(&bytes).with_context(|| {
            format!("Invalid payload bytes for instruction {}", instruction.index)
        })?;
        raw.push(decoded);
    }

    let batch = borsh::to_vec(&raw).context("Failed to serialize instruction batch")?;
    Ok(STANDARD.encode(batch))
}
