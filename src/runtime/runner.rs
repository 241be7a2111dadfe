//! The orchestration engine: one state machine per run.
//!
//! A run moves through three states: the guardrail gate, an active worker,
//! and exactly one terminal. The [`Runner`] owns the immutable graph, the
//! injected invoker, the continuation store, and the observability bus;
//! [`start`](Runner::start) spawns the run and returns a
//! [`RunHandle`] streaming fragments in generation order.
//!
//! The engine never retries and never repairs: a contract violation, an
//! upstream failure, or a misconfigured handoff is surfaced as a failure
//! terminal with the cause logged. Retry, when wanted, belongs to a
//! worker's own instructions. Hop counts are likewise unbounded here; loop
//! termination is policy embedded in the exchanged payloads.

use std::sync::Arc;

use miette::Diagnostic;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::instrument;
use uuid::Uuid;

use super::run::{FragmentSink, RunEvent, RunHandle, RunOutcome};
use super::session::{ContinuationToken, SessionStore};
use crate::contract::ContractViolation;
use crate::event_bus::{Event, EventBus};
use crate::graph::WorkerGraph;
use crate::guardrail::GuardrailVerdict;
use crate::invoker::{InvocationContext, InvokeError, WorkerInvoker, WorkerOutput};
use crate::message::Message;
use crate::tool::ToolError;
use crate::types::WorkerId;
use crate::worker::Worker;

/// Caller-facing text for a failure terminal. The underlying cause is
/// logged, never sent to the caller.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "The request could not be completed. The failure has been logged.";

/// Internal faults that end a run in a failure terminal.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("worker '{worker}' is not registered in the graph")]
    #[diagnostic(code(baton::runner::unknown_worker))]
    UnknownWorker { worker: WorkerId },

    #[error("worker '{from}' requested a handoff to '{to}' with no registered edge")]
    #[diagnostic(
        code(baton::runner::unregistered_handoff),
        help("Register the edge with GraphBuilder::add_handoff before running.")
    )]
    UnregisteredHandoff { from: WorkerId, to: WorkerId },

    #[error("handoff payload from '{from}' to '{to}' does not match the edge transform")]
    #[diagnostic(code(baton::runner::transform_mismatch))]
    TransformMismatch {
        from: WorkerId,
        to: WorkerId,
        #[source]
        violation: ContractViolation,
    },

    #[error("worker '{worker}' violated its output contract")]
    #[diagnostic(code(baton::runner::contract_violation))]
    Contract {
        worker: WorkerId,
        #[source]
        violation: ContractViolation,
    },

    #[error("worker '{worker}' declared a contract but produced no structured output")]
    #[diagnostic(code(baton::runner::missing_structured_output))]
    MissingStructuredOutput { worker: WorkerId },

    #[error("worker '{worker}' requested unknown tool '{tool}'")]
    #[diagnostic(code(baton::runner::unknown_tool))]
    UnknownTool { worker: WorkerId, tool: String },

    #[error(transparent)]
    #[diagnostic(code(baton::runner::invoke))]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    #[diagnostic(code(baton::runner::tool))]
    Tool(#[from] ToolError),

    #[error("caller disconnected before the run finished")]
    #[diagnostic(code(baton::runner::disconnected))]
    Disconnected,
}

/// Internal completion states before mapping to a [`RunOutcome`].
enum Completion {
    Finished {
        output: Option<Value>,
        continuation: Option<ContinuationToken>,
    },
    Rejected {
        explanation: String,
    },
}

/// Runtime execution engine for a compiled worker graph.
///
/// One `Runner` serves any number of runs; runs share only the immutable
/// graph and the bounded continuation store. Each call to
/// [`start`](Self::start) owns its conversation history and fragment
/// channel.
///
/// # Examples
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use baton::graph::WorkerGraph;
/// # use baton::invoker::WorkerInvoker;
/// # use baton::runtime::{RunEvent, Runner};
/// # async fn example(graph: WorkerGraph, invoker: Arc<dyn WorkerInvoker>) {
/// let runner = Runner::new(graph, invoker);
/// let mut handle = runner.start("triage", "fly to ny from winnipeg", None);
/// while let Some(event) = handle.next_event().await {
///     if let RunEvent::Fragment(text) = event {
///         print!("{text}");
///     }
/// }
/// # }
/// ```
pub struct Runner {
    graph: Arc<WorkerGraph>,
    invoker: Arc<dyn WorkerInvoker>,
    sessions: Arc<SessionStore>,
    event_bus: EventBus,
}

impl Runner {
    /// Creates a runner with the default event bus (stdout sink).
    #[must_use]
    pub fn new(graph: WorkerGraph, invoker: Arc<dyn WorkerInvoker>) -> Self {
        Self::with_event_bus(graph, invoker, EventBus::default())
    }

    /// Creates a runner broadcasting lifecycle events to a custom bus.
    #[must_use]
    pub fn with_event_bus(
        graph: WorkerGraph,
        invoker: Arc<dyn WorkerInvoker>,
        event_bus: EventBus,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(graph.config().session_capacity));
        Self {
            graph: Arc::new(graph),
            invoker,
            sessions,
            event_bus,
        }
    }

    /// The observability bus this runner mirrors lifecycle events onto.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// The continuation store backing multi-turn conversations.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Starts one orchestration run.
    ///
    /// The run executes on a spawned task; the returned handle streams
    /// fragments in generation order followed by exactly one terminal
    /// marker. Passing a continuation token from a prior run resumes that
    /// conversation, both for the workers and for the guardrail judging
    /// the follow-up.
    pub fn start(
        &self,
        entry: impl Into<WorkerId>,
        prompt: impl Into<String>,
        token: Option<ContinuationToken>,
    ) -> RunHandle {
        self.event_bus.listen_for_events();

        let entry = entry.into();
        let prompt = prompt.into();
        let run_id = Uuid::new_v4().to_string();
        let (events_tx, events_rx) = flume::unbounded();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let driver = RunDriver {
            graph: Arc::clone(&self.graph),
            invoker: Arc::clone(&self.invoker),
            sessions: Arc::clone(&self.sessions),
            run_id: run_id.clone(),
            events_tx,
            bus_tx: self.event_bus.get_sender(),
        };

        let task = tokio::spawn(async move {
            let outcome = match driver.drive(entry, prompt, token).await {
                Ok(Completion::Finished {
                    output,
                    continuation,
                }) => RunOutcome::Success {
                    output,
                    continuation,
                },
                Ok(Completion::Rejected { explanation }) => RunOutcome::Rejected { explanation },
                Err(RunnerError::Disconnected) => {
                    tracing::debug!(run = %driver.run_id, "caller disconnected; abandoning run");
                    return;
                }
                Err(error) => {
                    tracing::error!(run = %driver.run_id, error = %error, "run failed");
                    RunOutcome::Failed {
                        message: GENERIC_FAILURE_MESSAGE.to_string(),
                    }
                }
            };
            driver.finish(outcome, outcome_tx);
        });

        RunHandle::new(run_id, events_rx, outcome_rx, task)
    }
}

/// Everything one spawned run needs, detached from the `Runner`.
struct RunDriver {
    graph: Arc<WorkerGraph>,
    invoker: Arc<dyn WorkerInvoker>,
    sessions: Arc<SessionStore>,
    run_id: String,
    events_tx: flume::Sender<RunEvent>,
    bus_tx: flume::Sender<Event>,
}

impl RunDriver {
    #[instrument(skip(self, prompt, token), fields(run = %self.run_id), err)]
    async fn drive(
        &self,
        entry: WorkerId,
        prompt: String,
        token: Option<ContinuationToken>,
    ) -> Result<Completion, RunnerError> {
        let config = self.graph.config();
        let mut history = self.resume_history(token.as_ref());
        history.push(Message::user(&prompt));
        let token_str = token.as_ref().map(|t| t.as_str().to_string());
        let mut turn: u64 = 0;

        if let Some(gate_id) = &config.guardrail {
            let verdict = self
                .run_guardrail(gate_id, &prompt, &history, token_str.clone(), turn)
                .await?;
            turn += 1;
            if !verdict.in_domain {
                let explanation = verdict
                    .explanation
                    .unwrap_or_else(|| config.rejection_message.clone());
                return Ok(Completion::Rejected { explanation });
            }
        }

        let mut active = entry;
        let mut input = Value::String(prompt);
        loop {
            if self.events_tx.is_disconnected() {
                return Err(RunnerError::Disconnected);
            }
            let worker = self
                .graph
                .worker(&active)
                .cloned()
                .ok_or_else(|| RunnerError::UnknownWorker {
                    worker: active.clone(),
                })?;

            worker.hooks().notify_start(&active, &input);
            let _ = self.bus_tx.send(Event::worker_start(active.clone(), turn));

            let output = self
                .invoke_resolving_tools(&worker, &input, &mut history, turn, token_str.clone())
                .await?;

            let _ = self.bus_tx.send(Event::worker_end(active.clone(), turn));

            if let Some(text) = &output.text {
                history.push(Message::assistant(text));
            } else if let Some(value) = &output.structured {
                history.push(Message::assistant(&value.to_string()));
            }

            if let Some(request) = output.handoff {
                let edge = self.graph.edge(&active, &request.target).ok_or_else(|| {
                    RunnerError::UnregisteredHandoff {
                        from: active.clone(),
                        to: request.target.clone(),
                    }
                })?;
                let mut payload = request.payload;
                if let Some(transform) = &edge.transform {
                    payload = transform.validate(payload).map_err(|violation| {
                        RunnerError::TransformMismatch {
                            from: active.clone(),
                            to: request.target.clone(),
                            violation,
                        }
                    })?;
                }
                if let Some(observer) = &edge.observer {
                    observer(&active, &request.target, &payload);
                }
                worker
                    .hooks()
                    .notify_handoff(&active, &request.target, &payload);
                let _ = self
                    .bus_tx
                    .send(Event::handoff(active.clone(), request.target.clone()));

                active = request.target;
                input = payload;
                turn += 1;
                continue;
            }

            // Terminal turn: the worker's own contract governs the result.
            let structured = match worker.contract() {
                Some(contract) => {
                    let candidate =
                        output
                            .structured
                            .ok_or_else(|| RunnerError::MissingStructuredOutput {
                                worker: active.clone(),
                            })?;
                    Some(
                        contract
                            .validate(candidate)
                            .map_err(|violation| RunnerError::Contract {
                                worker: active.clone(),
                                violation,
                            })?,
                    )
                }
                None => output.structured,
            };
            let final_output = structured.or_else(|| output.text.map(Value::String));
            worker
                .hooks()
                .notify_end(&active, final_output.as_ref().unwrap_or(&Value::Null));

            let continuation = Some(self.sessions.store(history));
            return Ok(Completion::Finished {
                output: final_output,
                continuation,
            });
        }
    }

    /// Resolves tool calls until the worker produces a final output or a
    /// handoff. Each resolved call appends its result to the history the
    /// next invocation sees.
    async fn invoke_resolving_tools(
        &self,
        worker: &Worker,
        input: &Value,
        history: &mut Vec<Message>,
        turn: u64,
        token: Option<String>,
    ) -> Result<WorkerOutput, RunnerError> {
        loop {
            let ctx = InvocationContext::new(
                worker.name().clone(),
                turn,
                history.clone(),
                token.clone(),
                FragmentSink::new(
                    worker.name().clone(),
                    self.events_tx.clone(),
                    self.bus_tx.clone(),
                ),
            );
            let output = self.invoker.invoke(worker, input, &ctx).await?;
            if output.tool_calls.is_empty() {
                return Ok(output);
            }
            for call in &output.tool_calls {
                let tool =
                    worker
                        .tool(&call.tool)
                        .ok_or_else(|| RunnerError::UnknownTool {
                            worker: worker.name().clone(),
                            tool: call.tool.clone(),
                        })?;
                worker
                    .hooks()
                    .notify_tool_start(worker.name(), &call.tool, &call.args);
                let _ = self
                    .bus_tx
                    .send(Event::tool_start(worker.name().clone(), call.tool.clone()));

                let result = tool.call(call.args.clone()).await?;

                worker
                    .hooks()
                    .notify_tool_end(worker.name(), &call.tool, &result);
                let _ = self
                    .bus_tx
                    .send(Event::tool_end(worker.name().clone(), call.tool.clone()));

                history.push(Message::tool(&result.to_string()));
            }
        }
    }

    async fn run_guardrail(
        &self,
        gate_id: &WorkerId,
        prompt: &str,
        history: &[Message],
        token: Option<String>,
        turn: u64,
    ) -> Result<GuardrailVerdict, RunnerError> {
        let gate = self
            .graph
            .worker(gate_id)
            .cloned()
            .ok_or_else(|| RunnerError::UnknownWorker {
                worker: gate_id.clone(),
            })?;
        let input = json!({ "prompt": prompt });

        gate.hooks().notify_start(gate_id, &input);
        let _ = self.bus_tx.send(Event::worker_start(gate_id.clone(), turn));

        let ctx = InvocationContext::new(
            gate_id.clone(),
            turn,
            history.to_vec(),
            token,
            FragmentSink::new(
                gate_id.clone(),
                self.events_tx.clone(),
                self.bus_tx.clone(),
            ),
        );
        let output = self.invoker.invoke(&gate, &input, &ctx).await?;
        let _ = self.bus_tx.send(Event::worker_end(gate_id.clone(), turn));

        let value = output
            .structured
            .ok_or_else(|| RunnerError::MissingStructuredOutput {
                worker: gate_id.clone(),
            })?;
        let verdict =
            GuardrailVerdict::from_value(&value).map_err(|violation| RunnerError::Contract {
                worker: gate_id.clone(),
                violation,
            })?;
        gate.hooks().notify_end(gate_id, &value);
        Ok(verdict)
    }

    fn resume_history(&self, token: Option<&ContinuationToken>) -> Vec<Message> {
        match token {
            None => Vec::new(),
            Some(token) => match self.sessions.resume(token) {
                Some(history) => history,
                None => {
                    tracing::debug!(run = %self.run_id, "continuation token unknown; starting fresh");
                    Vec::new()
                }
            },
        }
    }

    /// Delivers the terminal marker, mirrors it on the bus, and resolves
    /// the outcome channel. Exactly one terminal per run.
    fn finish(&self, outcome: RunOutcome, outcome_tx: oneshot::Sender<RunOutcome>) {
        let (terminal, status) = match &outcome {
            RunOutcome::Success { continuation, .. } => (
                RunEvent::End {
                    continuation: continuation.clone(),
                },
                "completed",
            ),
            RunOutcome::Rejected { explanation } => (
                RunEvent::Error {
                    message: explanation.clone(),
                },
                "rejected",
            ),
            RunOutcome::Failed { message } => (
                RunEvent::Error {
                    message: message.clone(),
                },
                "failed",
            ),
        };
        let _ = self.events_tx.send(terminal);
        let _ = self
            .bus_tx
            .send(Event::run_end(self.run_id.clone(), status));
        let _ = outcome_tx.send(outcome);
    }
}
