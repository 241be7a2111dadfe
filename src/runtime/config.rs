//! Runtime configuration carried by a compiled graph.

use crate::types::WorkerId;

/// Default caller-facing text for a declined request when the gate supplies
/// no explanation of its own.
pub const DEFAULT_REJECTION_MESSAGE: &str =
    "This assistant only answers questions inside its domain. Try rephrasing your request.";

const DEFAULT_SESSION_CAPACITY: usize = 256;

/// Configuration attached to a graph at build time.
///
/// # Examples
///
/// ```rust
/// use baton::runtime::RunnerConfig;
///
/// let config = RunnerConfig::default()
///     .with_guardrail("flights-filter")
///     .with_rejection_message("This assistant only answers flights questions.");
/// assert!(config.guardrail.is_some());
/// ```
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Worker invoked as the guardrail gate before the main graph. `None`
    /// disables the gate.
    pub guardrail: Option<WorkerId>,
    /// Fallback rejection text when a negative verdict has no explanation.
    pub rejection_message: String,
    /// Bound on conversations retained for continuation tokens.
    pub session_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            guardrail: None,
            rejection_message: DEFAULT_REJECTION_MESSAGE.to_string(),
            session_capacity: resolve_session_capacity(),
        }
    }
}

impl RunnerConfig {
    /// Names the worker to run as the guardrail gate.
    #[must_use]
    pub fn with_guardrail(mut self, worker: impl Into<WorkerId>) -> Self {
        self.guardrail = Some(worker.into());
        self
    }

    /// Overrides the fallback rejection message.
    #[must_use]
    pub fn with_rejection_message(mut self, message: impl Into<String>) -> Self {
        self.rejection_message = message.into();
        self
    }

    /// Overrides the continuation store bound.
    #[must_use]
    pub fn with_session_capacity(mut self, capacity: usize) -> Self {
        self.session_capacity = capacity.max(1);
        self
    }
}

fn resolve_session_capacity() -> usize {
    dotenvy::dotenv().ok();
    std::env::var("BATON_SESSION_CAPACITY")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_SESSION_CAPACITY)
}
