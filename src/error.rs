//! Error taxonomy for the instruction lifecycle.
//!
//! Only recoverable failures that callers need to tell apart get a typed
//! variant here. Everything else flows through `anyhow::Result` with context
//! attached at the call site. Validation problems are never errors - they are
//! returned as data (`ValidationResult`).

use thiserror::Error;

/// Recoverable failures raised by builders and the execution controller.
///
/// These are caught locally and converted to state (error flags,
/// notifications). Nothing in this crate propagates them as an unhandled
/// fault that would abort the proposal view.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The requested pool label is not present in the pool registry.
    #[error("unknown liquidity pool '{0}'")]
    UnknownPool(String),

    /// The governed owner has no token account for the given mint.
    ///
    /// Surfaced to the UI as a notification, not a fault: the user may simply
    /// have selected a governance that never held this LP token.
    #[error("no token account found for mint {mint} owned by {owner}")]
    TokenAccountNotFound { mint: String, owner: String },

    /// Batch submission was rejected or faulted at the RPC layer.
    #[error("instruction batch submission failed: {0}")]
    SubmissionFailed(String),

    /// The counter-amount quote could not be computed (empty vault, missing
    /// pool state).
    #[error("quote computation failed for pool '{pool}': {reason}")]
    QuoteFailed { pool: String, reason: String },
}
