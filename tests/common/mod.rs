#![allow(dead_code)]

//! Shared fixtures: deterministic fakes for the invoker and tool
//! boundaries, plus helpers for draining run handles.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};

use baton::contract::{CrossFieldRule, FieldKind, OutputContract};
use baton::invoker::{InvocationContext, InvokeError, WorkerInvoker, WorkerOutput};
use baton::runtime::{RunEvent, RunHandle, RunOutcome};
use baton::tool::{Tool, ToolError};
use baton::types::WorkerId;
use baton::worker::Worker;

/// Replays scripted outputs per worker, in order, and records every call.
pub struct ScriptedInvoker {
    scripts: Mutex<FxHashMap<WorkerId, VecDeque<WorkerOutput>>>,
    calls: Mutex<Vec<WorkerId>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(FxHashMap::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues outputs for a worker; one output is consumed per invocation.
    pub fn script(self, worker: impl Into<WorkerId>, outputs: Vec<WorkerOutput>) -> Self {
        self.scripts
            .lock()
            .entry(worker.into())
            .or_default()
            .extend(outputs);
        self
    }

    /// Every invocation so far, in order.
    pub fn calls(&self) -> Vec<WorkerId> {
        self.calls.lock().clone()
    }

    /// How many times the named worker was invoked.
    pub fn count_for(&self, worker: &str) -> usize {
        let id: WorkerId = worker.into();
        self.calls.lock().iter().filter(|w| **w == id).count()
    }
}

#[async_trait]
impl WorkerInvoker for ScriptedInvoker {
    async fn invoke(
        &self,
        worker: &Worker,
        _input: &Value,
        _ctx: &InvocationContext,
    ) -> Result<WorkerOutput, InvokeError> {
        self.calls.lock().push(worker.name().clone());
        self.scripts
            .lock()
            .get_mut(worker.name())
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| InvokeError::Unavailable {
                message: format!("no scripted output left for worker '{}'", worker.name()),
            })
    }
}

/// Computes outputs from a closure; the closure sees worker, input, and the
/// invocation context (history, token, fragment emitter).
pub struct FnInvoker<F>
where
    F: Fn(&Worker, &Value, &InvocationContext) -> Result<WorkerOutput, InvokeError> + Send + Sync,
{
    behavior: F,
    calls: Mutex<Vec<WorkerId>>,
}

impl<F> FnInvoker<F>
where
    F: Fn(&Worker, &Value, &InvocationContext) -> Result<WorkerOutput, InvokeError> + Send + Sync,
{
    pub fn new(behavior: F) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<WorkerId> {
        self.calls.lock().clone()
    }

    pub fn count_for(&self, worker: &str) -> usize {
        let id: WorkerId = worker.into();
        self.calls.lock().iter().filter(|w| **w == id).count()
    }
}

#[async_trait]
impl<F> WorkerInvoker for FnInvoker<F>
where
    F: Fn(&Worker, &Value, &InvocationContext) -> Result<WorkerOutput, InvokeError> + Send + Sync,
{
    async fn invoke(
        &self,
        worker: &Worker,
        input: &Value,
        ctx: &InvocationContext,
    ) -> Result<WorkerOutput, InvokeError> {
        self.calls.lock().push(worker.name().clone());
        (self.behavior)(worker, input, ctx)
    }
}

/// Tool returning a fixed value for every call, recording its invocations.
pub struct FixedTool {
    name: String,
    result: Value,
    calls: Arc<Mutex<Vec<Value>>>,
}

impl FixedTool {
    pub fn new(name: impl Into<String>, result: Value) -> Self {
        Self {
            name: name.into(),
            result,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the recorded args, usable after the tool moves into a
    /// worker.
    pub fn call_log(&self) -> Arc<Mutex<Vec<Value>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl Tool for FixedTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        self.calls.lock().push(args);
        Ok(self.result.clone())
    }
}

/// The flight-query contract used across the end-to-end scenarios.
pub fn flight_contract() -> OutputContract {
    OutputContract::new()
        .required("origin", FieldKind::String)
        .required("destination", FieldKind::String)
        .required("departureDate", FieldKind::Date)
        .optional("returnDate", FieldKind::Date)
        .rule(CrossFieldRule::DateOrder {
            start: "departureDate".into(),
            end: "returnDate".into(),
        })
}

/// A guardrail verdict value, as a gate worker would emit it.
pub fn verdict(in_domain: bool, explanation: Option<&str>) -> Value {
    match explanation {
        Some(text) => json!({"in_domain": in_domain, "explanation": text}),
        None => json!({"in_domain": in_domain}),
    }
}

/// Drains a handle to completion: all events in arrival order, then the
/// outcome.
pub async fn drain(mut handle: RunHandle) -> (Vec<RunEvent>, RunOutcome) {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    (events, handle.outcome().await)
}

/// Fragments of an event sequence, in order.
pub fn fragments(events: &[RunEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Fragment(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// Terminal markers of an event sequence (there must be exactly one).
pub fn terminals(events: &[RunEvent]) -> Vec<&RunEvent> {
    events
        .iter()
        .filter(|e| !matches!(e, RunEvent::Fragment(_)))
        .collect()
}
