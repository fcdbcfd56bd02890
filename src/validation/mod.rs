//! Async Validator
//!
//! Schema-driven form validation plus the timing plumbing around it: a
//! coalescing debouncer so rapid edits produce at most one derivation or
//! validation pass after input settles, and a monotonic generation counter
//! so stale in-flight results are discarded deterministically instead of
//! relying on arrival order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

/// Outcome of validating a form record against its schema.
///
/// Always fully replaces the previous result; results are never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no field has an error
    pub is_valid: bool,
    /// Field name -> first error message for that field
    pub field_errors: HashMap<String, String>,
}

impl ValidationResult {
    /// A fully valid result with no field errors.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            field_errors: HashMap::new(),
        }
    }

    /// Builds a result from collected field errors.
    pub fn from_errors(field_errors: HashMap<String, String>) -> Self {
        Self {
            is_valid: field_errors.is_empty(),
            field_errors,
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

type Check<F> = Box<dyn Fn(&F) -> Option<String> + Send + Sync>;

/// A single named-field rule: returns an error message or None.
struct Rule<F> {
    field: &'static str,
    check: Check<F>,
}

/// Validation schema for a form record: an ordered list of per-field rules.
///
/// Only the first failing rule per field is reported, so a missing required
/// value does not also trip its bounds check.
pub struct Schema<F> {
    rules: Vec<Rule<F>>,
}

impl<F> Schema<F> {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule for a named field.
    ///
    /// # Arguments
    ///
    /// * `field` - Field name used as the error key
    /// * `check` - Returns Some(message) when the rule fails
    pub fn rule(
        mut self,
        field: &'static str,
        check: impl Fn(&F) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Rule {
            field,
            check: Box::new(check),
        });
        self
    }
}

impl<F> Default for Schema<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the schema against the current form record.
///
/// Asynchronous so it can be driven alongside further field edits; callers
/// apply the last-observed-result policy (see `Generation`).
///
/// # Returns
///
/// The full validation result, replacing any previous one.
pub async fn is_form_valid<F>(schema: &Schema<F>, form: &F) -> ValidationResult {
    let mut field_errors: HashMap<String, String> = HashMap::new();

    for rule in &schema.rules {
        if field_errors.contains_key(rule.field) {
            // First error per field wins
            continue;
        }
        if let Some(message) = (rule.check)(form) {
            field_errors.insert(rule.field.to_string(), message);
        }
    }

    ValidationResult::from_errors(field_errors)
}

// ============================================================================
// DEBOUNCER
// ============================================================================

/// Coalescing task scheduler.
///
/// Each `debounce` call cancels any pending scheduled task and schedules the
/// new one after the configured delay, so a burst of triggers runs the task
/// at most once after input settles. The pending task is aborted on
/// `cancel()` and on drop, and never fires after either.
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Debouncer {
    /// Creates a debouncer with the given coalescing window.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Schedules `task` to run after the delay, replacing any pending task.
    pub fn debounce<T>(&self, task: T)
    where
        T: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut pending = self.pending.lock().expect("debouncer lock poisoned");
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Cancels any pending task without scheduling a new one.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().expect("debouncer lock poisoned");
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        // Only the last clone tears the pending task down
        if Arc::strong_count(&self.pending) == 1 {
            self.cancel();
        }
    }
}

// ============================================================================
// GENERATION COUNTER
// ============================================================================

/// Monotonic counter making async races deterministic.
///
/// Every field edit bumps the generation. An async validation or derivation
/// captures the generation when issued; when it resolves, the result is
/// applied only if the generation is still current. Stale resolutions are
/// dropped instead of overwriting newer state.
#[derive(Clone, Default)]
pub struct Generation {
    counter: Arc<AtomicU64>,
}

impl Generation {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the generation and returns the new value.
    pub fn bump(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current generation.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// True if `issued` is still the current generation.
    pub fn is_current(&self, issued: u64) -> bool {
        self.current() == issued
    }
}
