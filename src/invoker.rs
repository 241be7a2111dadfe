//! The opaque model-call boundary the engine drives workers through.
//!
//! The engine never talks to a language model directly. It hands a worker,
//! the current input, and an [`InvocationContext`] to an injected
//! [`WorkerInvoker`] and inspects the returned [`WorkerOutput`]: final text,
//! a structured value, a handoff request, or tool calls to resolve. Because
//! the boundary is a trait object, the engine's control flow is fully
//! testable with deterministic fakes.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::message::Message;
use crate::runtime::{FragmentSink, FragmentStreamClosed};
use crate::types::WorkerId;
use crate::worker::Worker;

/// A tool call requested by a worker's output.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    /// Name of a tool attached to the requesting worker.
    pub tool: String,
    pub args: Value,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }
}

/// A worker ending its turn by naming a handoff target.
#[derive(Clone, Debug, PartialEq)]
pub struct HandoffRequest {
    /// Target worker; must be reachable through a registered edge.
    pub target: WorkerId,
    /// Payload forwarded to the target, subject to the edge's transform.
    pub payload: Value,
}

impl HandoffRequest {
    pub fn new(target: impl Into<WorkerId>, payload: Value) -> Self {
        Self {
            target: target.into(),
            payload,
        }
    }
}

/// What one invocation of a worker produced.
///
/// Exactly one of `handoff`, `tool_calls`, or a final result (text and/or
/// `structured`) is meaningful per turn. When `tool_calls` is non-empty the
/// engine resolves them and re-invokes; when `handoff` is set the engine
/// traverses the edge; otherwise the turn is terminal for the run.
#[derive(Clone, Debug, Default)]
pub struct WorkerOutput {
    /// Final prose, if any. Streamed fragments are emitted separately
    /// through the context; this field is the assembled result.
    pub text: Option<String>,
    /// Structured result, validated against the worker's contract when one
    /// is declared.
    pub structured: Option<Value>,
    /// Request to pass control to another worker.
    pub handoff: Option<HandoffRequest>,
    /// Tool invocations to resolve before this worker can finish its turn.
    pub tool_calls: Vec<ToolCall>,
}

impl WorkerOutput {
    /// A turn ending in plain text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A turn ending in a structured value.
    #[must_use]
    pub fn structured(value: Value) -> Self {
        Self {
            structured: Some(value),
            ..Default::default()
        }
    }

    /// A turn ending in a handoff.
    #[must_use]
    pub fn handoff(target: impl Into<WorkerId>, payload: Value) -> Self {
        Self {
            handoff: Some(HandoffRequest::new(target, payload)),
            ..Default::default()
        }
    }

    /// A turn requesting tool calls before continuing.
    #[must_use]
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Default::default()
        }
    }

    /// Adds a structured value to this output.
    #[must_use]
    pub fn with_structured(mut self, value: Value) -> Self {
        self.structured = Some(value);
        self
    }

    /// Adds final text to this output.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Failure modes of the invocation boundary.
///
/// The engine propagates these as a failure terminal; retry, if wanted, is a
/// worker-policy concern, never the engine's.
#[derive(Debug, Error, Diagnostic)]
pub enum InvokeError {
    /// The model produced output the boundary could not shape into a
    /// [`WorkerOutput`] (e.g. unparseable where structure was demanded).
    #[error("worker produced malformed output: {detail}")]
    #[diagnostic(code(baton::invoke::malformed))]
    MalformedOutput { detail: String },

    /// The upstream model endpoint failed or could not be reached.
    #[error("upstream invocation failed: {message}")]
    #[diagnostic(code(baton::invoke::unavailable))]
    Unavailable { message: String },

    /// The boundary's own time budget elapsed. Surfaced as a failure, never
    /// as silent termination.
    #[error("invocation timed out after {seconds}s")]
    #[diagnostic(code(baton::invoke::timeout))]
    Timeout { seconds: u64 },
}

/// Per-invocation view of the run handed to the invoker.
///
/// The context is a read-only snapshot plus the fragment emitter; mutating
/// run state stays with the engine.
#[derive(Debug)]
pub struct InvocationContext {
    worker: WorkerId,
    turn: u64,
    history: Vec<Message>,
    continuation: Option<String>,
    fragments: FragmentSink,
}

impl InvocationContext {
    pub(crate) fn new(
        worker: WorkerId,
        turn: u64,
        history: Vec<Message>,
        continuation: Option<String>,
        fragments: FragmentSink,
    ) -> Self {
        Self {
            worker,
            turn,
            history,
            continuation,
            fragments,
        }
    }

    /// The worker being invoked.
    #[must_use]
    pub fn worker(&self) -> &WorkerId {
        &self.worker
    }

    /// Zero-based turn number within the run.
    #[must_use]
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Conversation so far: resumed history, the caller prompt, worker
    /// replies, and tool results.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Continuation token this run was started with, if any.
    #[must_use]
    pub fn continuation(&self) -> Option<&str> {
        self.continuation.as_deref()
    }

    /// Stream one fragment of text to the caller, in generation order.
    pub fn emit_fragment(&self, chunk: impl Into<String>) -> Result<(), FragmentStreamClosed> {
        self.fragments.emit(chunk)
    }
}

/// The injected model-call boundary.
///
/// Implementations may stream partial text through
/// [`InvocationContext::emit_fragment`] while producing the final
/// [`WorkerOutput`].
#[async_trait]
pub trait WorkerInvoker: Send + Sync {
    async fn invoke(
        &self,
        worker: &Worker,
        input: &Value,
        ctx: &InvocationContext,
    ) -> Result<WorkerOutput, InvokeError>;
}
