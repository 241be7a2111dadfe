//! Two-worker confirmation loop demo. Worker B confirms every message from
//! worker A exactly twice by appending stage markers; the payload itself
//! carries the loop state, the engine just follows handoffs.
//!
//! Run with: cargo run --example confirmation

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use baton::graph::GraphBuilder;
use baton::invoker::{InvocationContext, InvokeError, WorkerInvoker, WorkerOutput};
use baton::runtime::Runner;
use baton::worker::Worker;

struct ConfirmationInvoker;

#[async_trait]
impl WorkerInvoker for ConfirmationInvoker {
    async fn invoke(
        &self,
        worker: &Worker,
        input: &Value,
        _ctx: &InvocationContext,
    ) -> Result<WorkerOutput, InvokeError> {
        let text = input.as_str().unwrap_or_default().to_string();
        match worker.name().as_str() {
            "agent-a" => {
                if text.ends_with("stage-2") {
                    Ok(WorkerOutput::text(text))
                } else {
                    Ok(WorkerOutput::handoff("agent-b", json!(text)))
                }
            }
            _ => {
                let updated = if text.ends_with("stage-2") {
                    text
                } else if text.ends_with("stage-1") {
                    format!("{text} stage-2")
                } else {
                    format!("{text} stage-1")
                };
                Ok(WorkerOutput::handoff("agent-a", json!(updated)))
            }
        }
    }
}

#[tokio::main]
async fn main() {
    baton::telemetry::init();

    let graph = GraphBuilder::new()
        .add_worker(
            Worker::builder("agent-a")
                .on_handoff(|from, to, payload| println!("{from} -> {to}: {payload}"))
                .build(),
        )
        .add_worker(
            Worker::builder("agent-b")
                .on_handoff(|from, to, payload| println!("{from} -> {to}: {payload}"))
                .build(),
        )
        .add_handoff("agent-a", "agent-b")
        .add_handoff("agent-b", "agent-a")
        .compile()
        .expect("demo graph is valid");

    let runner = Runner::new(graph, Arc::new(ConfirmationInvoker));
    let outcome = runner.start("agent-a", "hello", None).outcome().await;
    println!("final: {outcome:?}");
}
