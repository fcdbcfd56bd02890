//! Instruction Builder and Instruction Aggregator
//!
//! The builder orchestrates Form Model, Async Validator and the external
//! quote/metadata services to keep an always-current serialized instruction
//! registered at a fixed slot in the shared aggregator. One generic builder
//! is parameterized by a per-kind strategy (schema, derivations, on-chain
//! construction) so each instruction kind is data, not duplicated plumbing.
//!
//! Many independent builders feed the same proposal; each owns exactly one
//! aggregator index and never writes another's slot. Writes are
//! single-threaded and index-partitioned, so the aggregator needs overwrite
//! semantics only (last write for an index wins).

pub mod strategies;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

use crate::form::FormRecord;
use crate::notify::Notifier;
use crate::rpc_client::RpcClient;
use crate::sdk::{serialize_instruction, PoolRegistry, RawInstruction};
use crate::validation::{is_form_valid, Debouncer, Generation, Schema, ValidationResult};

// ============================================================================
// SERIALIZED INSTRUCTION
// ============================================================================

/// A serialized instruction produced by one builder.
///
/// Immutable once produced: a new form state yields a brand-new value,
/// never an in-place patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiInstruction {
    /// Base64 instruction payload; empty when invalid
    pub serialized_instruction: String,
    /// Whether the form passed validation and construction succeeded
    pub is_valid: bool,
    /// Governance account the instruction executes under
    pub governed_account: Option<Pubkey>,
}

impl UiInstruction {
    /// The invalid placeholder registered while a form is incomplete.
    pub fn invalid(governed_account: Option<Pubkey>) -> Self {
        Self {
            serialized_instruction: String::new(),
            is_valid: false,
            governed_account,
        }
    }
}

// ============================================================================
// EXTERNAL SERVICES
// ============================================================================

/// Shared handles to the external collaborators a builder needs.
#[derive(Clone)]
pub struct ChainServices {
    /// Chain query client (slot, mint metadata, balances)
    pub rpc: Arc<RpcClient>,
    /// Registry of pools offered by the pool selector
    pub pools: Arc<PoolRegistry>,
    /// Channel for user-visible recoverable failures
    pub notifier: Notifier,
}

// ============================================================================
// STRATEGY
// ============================================================================

/// Per-instruction-kind behavior plugged into the generic builder.
///
/// `derive` and `build` return stored futures so strategies stay object-safe
/// data: they capture cheap service handles and a form snapshot, never the
/// builder itself.
pub trait InstructionStrategy: Send + Sync + 'static {
    /// Form record this kind edits
    type Form: FormRecord + Default;

    /// Validation schema for the form.
    fn schema(&self) -> Schema<Self::Form>;

    /// Governance account currently selected on the form, if any.
    fn governed_account(&self, form: &Self::Form) -> Option<Pubkey>;

    /// Clears derived fields that became stale because `changed_field` was
    /// edited (e.g. a new pool invalidates the derived counter amount).
    fn clear_derived(&self, form: &Self::Form, changed_field: &str) -> Self::Form {
        let _ = changed_field;
        form.clone()
    }

    /// True when editing `changed_field` should schedule a derivation pass
    /// instead of a plain revalidation.
    fn is_derivation_source(&self, changed_field: &str) -> bool {
        let _ = changed_field;
        false
    }

    /// Computes derived fields from external state, returning the updated
    /// form. None when the source fields are not filled in yet.
    fn derive(
        &self,
        services: &ChainServices,
        form: Self::Form,
    ) -> Option<BoxFuture<'static, anyhow::Result<Self::Form>>>;

    /// Builds the raw on-chain instruction from a validated form, fetching
    /// any metadata (mint decimals) fresh.
    fn build(
        &self,
        services: &ChainServices,
        form: Self::Form,
    ) -> BoxFuture<'static, anyhow::Result<RawInstruction>>;

    /// Toast content for a recoverable lookup failure during derive/build.
    fn lookup_failure_notice(&self, form: &Self::Form, error: &anyhow::Error) -> (String, String) {
        let _ = form;
        (
            "Instruction lookup failed".to_string(),
            error.to_string(),
        )
    }
}

// ============================================================================
// INSTRUCTION AGGREGATOR
// ============================================================================

/// Stored async callable producing the entry's current instruction.
pub type InstructionSource = Box<dyn Fn() -> BoxFuture<'static, UiInstruction> + Send + Sync>;

/// What a builder registers at its index: its governance selection plus a
/// way to build the instruction lazily at submit time.
pub struct RegisteredEntry {
    /// Governance account the builder currently has selected
    pub governed_account: Option<Pubkey>,
    /// Builds the entry's latest instruction
    pub build: InstructionSource,
}

/// Ordered registry collecting all builders' outputs for one proposal.
///
/// Owned by the proposal-creation controller; each builder gets a narrow
/// `register` capability for its own index.
pub struct InstructionAggregator {
    entries: RwLock<BTreeMap<usize, RegisteredEntry>>,
}

impl InstructionAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registers (or overwrites) the entry at `index`.
    ///
    /// Overwrite semantics: the last write for a given index wins.
    pub async fn register(&self, index: usize, entry: RegisteredEntry) {
        let mut entries = self.entries.write().await;
        entries.insert(index, entry);
    }

    /// Number of registered entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when no builder has registered yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of (index, governed account) pairs in index order.
    pub async fn governed_accounts(&self) -> Vec<(usize, Option<Pubkey>)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(index, entry)| (*index, entry.governed_account))
            .collect()
    }

    /// Builds every registered entry's instruction, in index order.
    ///
    /// This is what the proposal-creation flow calls at submit time to
    /// assemble the full multi-instruction proposal.
    pub async fn build_all(&self) -> Vec<UiInstruction> {
        // Collect the futures first so the registry lock is not held across
        // the builds
        let builds: Vec<BoxFuture<'static, UiInstruction>> = {
            let entries = self.entries.read().await;
            entries.values().map(|entry| (entry.build)()).collect()
        };

        let mut instructions = Vec::with_capacity(builds.len());
        for build in builds {
            instructions.push(build.await);
        }
        instructions
    }
}

impl Default for InstructionAggregator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// INSTRUCTION BUILDER
// ============================================================================

struct BuilderState<F> {
    form: F,
    errors: ValidationResult,
}

/// Generic instruction builder for one aggregator slot.
///
/// Cheap to clone: all state is behind shared handles, so a clone observes
/// and mutates the same form, errors and registration.
pub struct InstructionBuilder<S: InstructionStrategy> {
    index: usize,
    strategy: Arc<S>,
    state: Arc<RwLock<BuilderState<S::Form>>>,
    services: ChainServices,
    aggregator: Arc<InstructionAggregator>,
    debouncer: Debouncer,
    generation: Generation,
}

impl<S: InstructionStrategy> Clone for InstructionBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            strategy: Arc::clone(&self.strategy),
            state: Arc::clone(&self.state),
            services: self.services.clone(),
            aggregator: Arc::clone(&self.aggregator),
            debouncer: self.debouncer.clone(),
            generation: self.generation.clone(),
        }
    }
}

impl<S: InstructionStrategy> InstructionBuilder<S> {
    /// Creates a builder for the given aggregator slot and registers its
    /// initial (invalid) entry.
    ///
    /// # Arguments
    ///
    /// * `index` - The aggregator slot this builder owns
    /// * `strategy` - Per-kind behavior (schema, derivations, construction)
    /// * `services` - External service handles
    /// * `aggregator` - Shared registry for the proposal under construction
    /// * `debounce_window` - Coalescing delay for derivation/validation
    pub async fn new(
        index: usize,
        strategy: S,
        services: ChainServices,
        aggregator: Arc<InstructionAggregator>,
        debounce_window: Duration,
    ) -> Self {
        let builder = Self {
            index,
            strategy: Arc::new(strategy),
            state: Arc::new(RwLock::new(BuilderState {
                form: S::Form::default(),
                errors: ValidationResult::valid(),
            })),
            services,
            aggregator,
            debouncer: Debouncer::new(debounce_window),
            generation: Generation::new(),
        };
        builder.register().await;
        builder
    }

    /// The aggregator slot this builder owns.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Snapshot of the current form record.
    pub async fn form(&self) -> S::Form {
        self.state.read().await.form.clone()
    }

    /// Snapshot of the current validation result (inline form feedback).
    pub async fn field_errors(&self) -> ValidationResult {
        self.state.read().await.errors.clone()
    }

    /// Replaces a single field, clearing all current field errors.
    ///
    /// Errors are considered stale the instant any field changes - a
    /// deliberate simplification favoring fewer stale-error false positives
    /// over finer-grained invalidation. Derived fields whose source selector
    /// changed are cleared and re-derived after the debounce window.
    pub async fn set_field(&self, patch: <S::Form as FormRecord>::Patch) {
        let changed_field = S::Form::field_name(&patch);
        let issued = self.generation.bump();

        {
            let mut state = self.state.write().await;
            let next = state.form.with_field(patch);
            state.form = self.strategy.clear_derived(&next, changed_field);
            state.errors = ValidationResult::valid();
        }

        self.register().await;

        let derivation = self.strategy.is_derivation_source(changed_field);
        let builder = self.clone();
        self.debouncer.debounce(async move {
            if derivation {
                builder.run_derivation(issued).await;
            } else {
                builder.run_validation(issued).await;
            }
        });
    }

    /// Runs the schema against the current form and stores the result.
    ///
    /// Safe to run concurrently with further edits: a result issued before a
    /// newer edit is discarded on resolve (generation check), so the stored
    /// errors always reflect the last observed write.
    pub async fn validate(&self) -> ValidationResult {
        let issued = self.generation.current();
        self.run_validation(issued).await
    }

    /// Builds the serialized instruction for the current form.
    ///
    /// Validates first; when the form is invalid or no governance account is
    /// selected, short-circuits to an invalid instruction without contacting
    /// any external service. Otherwise fetches fresh mint metadata, converts
    /// decimal amounts to integer base units, constructs the instruction and
    /// serializes it. Idempotent for an unchanged form.
    pub async fn build_instruction(&self) -> UiInstruction {
        let result = self.validate().await;
        let form = self.state.read().await.form.clone();
        let governed_account = self.strategy.governed_account(&form);

        if !result.is_valid || governed_account.is_none() {
            return UiInstruction::invalid(governed_account);
        }

        let raw = match self.strategy.build(&self.services, form.clone()).await {
            Ok(raw) => raw,
            Err(error) => {
                let (message, description) = self.strategy.lookup_failure_notice(&form, &error);
                self.services.notifier.notify_error(&message, &description);
                return UiInstruction::invalid(governed_account);
            }
        };

        match serialize_instruction(&raw) {
            Ok(payload) => UiInstruction {
                serialized_instruction: payload,
                is_valid: true,
                governed_account,
            },
            Err(error) => {
                warn!("Failed to serialize instruction: {}", error);
                UiInstruction::invalid(governed_account)
            }
        }
    }

    /// Re-registers this builder's latest entry at its fixed index.
    pub async fn register(&self) {
        let form = self.state.read().await.form.clone();
        let governed_account = self.strategy.governed_account(&form);

        let builder = self.clone();
        let build: InstructionSource = Box::new(move || {
            let builder = builder.clone();
            async move { builder.build_instruction().await }.boxed()
        });

        self.aggregator
            .register(
                self.index,
                RegisteredEntry {
                    governed_account,
                    build,
                },
            )
            .await;
    }

    /// Cancels any pending debounced work. Call on widget teardown.
    pub fn teardown(&self) {
        self.debouncer.cancel();
    }

    async fn run_derivation(&self, issued: u64) {
        let form = self.state.read().await.form.clone();
        match self.strategy.derive(&self.services, form.clone()) {
            Some(derivation) => match derivation.await {
                Ok(derived) => {
                    // Discard stale resolutions: a newer edit supersedes this
                    // derivation
                    if self.generation.is_current(issued) {
                        {
                            let mut state = self.state.write().await;
                            state.form = derived;
                        }
                        self.run_validation(issued).await;
                        self.register().await;
                    }
                }
                Err(error) => {
                    let (message, description) =
                        self.strategy.lookup_failure_notice(&form, &error);
                    self.services.notifier.notify_error(&message, &description);
                }
            },
            None => {
                self.run_validation(issued).await;
            }
        }
    }

    async fn run_validation(&self, issued: u64) -> ValidationResult {
        let schema = self.strategy.schema();
        let form = self.state.read().await.form.clone();
        let result = is_form_valid(&schema, &form).await;
        if self.generation.is_current(issued) {
            self.state.write().await.errors = result.clone();
        }
        result
    }
}
