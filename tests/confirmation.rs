//! The bounded ping-pong pattern: a user-facing worker A and a
//! confirmation worker B that appends one stage marker per visit. The
//! engine imposes no hop bound; termination comes entirely from the
//! markers embedded in the exchanged payload.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use baton::graph::{GraphBuilder, WorkerGraph};
use baton::invoker::{InvocationContext, InvokeError, WorkerInvoker, WorkerOutput};
use baton::runtime::{RunOutcome, Runner};
use baton::worker::Worker;

const STAGE_ONE: &str = "stage-1";
const STAGE_TWO: &str = "stage-2";

/// Implements both workers' policies deterministically.
struct ConfirmationInvoker {
    a_calls: AtomicUsize,
    b_calls: AtomicUsize,
}

impl ConfirmationInvoker {
    fn new() -> Self {
        Self {
            a_calls: AtomicUsize::new(0),
            b_calls: AtomicUsize::new(0),
        }
    }
}

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
            // A forwards anything unconfirmed to B; a doubly confirmed
            // payload goes back to the caller verbatim.
            "a" => {
                self.a_calls.fetch_add(1, Ordering::SeqCst);
                if text.ends_with(STAGE_TWO) {
                    Ok(WorkerOutput::text(text))
                } else {
                    Ok(WorkerOutput::handoff("b", json!(text)))
                }
            }
            // B appends the next marker and hands back; already doubly
            // confirmed payloads return untouched.
            _ => {
                self.b_calls.fetch_add(1, Ordering::SeqCst);
                let updated = if text.ends_with(STAGE_TWO) {
                    text
                } else if text.ends_with(STAGE_ONE) {
                    format!("{text} {STAGE_TWO}")
                } else {
                    format!("{text} {STAGE_ONE}")
                };
                Ok(WorkerOutput::handoff("a", json!(updated)))
            }
        }
    }
}

fn confirmation_graph(handoffs: Arc<AtomicUsize>) -> WorkerGraph {
    let a_counter = handoffs.clone();
    let b_counter = handoffs;
    GraphBuilder::new()
        .add_worker(
            Worker::builder("a")
                .on_handoff(move |_, _, _| {
                    a_counter.fetch_add(1, Ordering::SeqCst);
                })
                .build(),
        )
        .add_worker(
            Worker::builder("b")
                .on_handoff(move |_, _, _| {
                    b_counter.fetch_add(1, Ordering::SeqCst);
                })
                .build(),
        )
        .add_handoff("a", "b")
        .add_handoff("b", "a")
        .compile()
        .unwrap()
}

#[tokio::test]
async fn loop_terminates_after_exactly_two_round_trips() {
    let handoffs = Arc::new(AtomicUsize::new(0));
    let invoker = Arc::new(ConfirmationInvoker::new());
    let runner = Runner::new(confirmation_graph(handoffs.clone()), invoker.clone());

    let outcome = runner.start("a", "hello", None).outcome().await;

    let RunOutcome::Success { output, .. } = outcome else {
        panic!("expected success");
    };
    assert_eq!(
        output,
        Some(Value::String(format!("hello {STAGE_ONE} {STAGE_TWO}")))
    );
    // A ran three times (initial turn, then once after each confirmation);
    // B exactly twice. Never a third cycle.
    assert_eq!(invoker.a_calls.load(Ordering::SeqCst), 3);
    assert_eq!(invoker.b_calls.load(Ordering::SeqCst), 2);
    // Four traversals total: a->b, b->a, a->b, b->a.
    assert_eq!(handoffs.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn already_confirmed_payload_never_enters_the_loop() {
    let handoffs = Arc::new(AtomicUsize::new(0));
    let invoker = Arc::new(ConfirmationInvoker::new());
    let runner = Runner::new(confirmation_graph(handoffs.clone()), invoker.clone());

    let prompt = format!("done {STAGE_ONE} {STAGE_TWO}");
    let outcome = runner.start("a", prompt.clone(), None).outcome().await;

    let RunOutcome::Success { output, .. } = outcome else {
        panic!("expected success");
    };
    assert_eq!(output, Some(Value::String(prompt)));
    assert_eq!(invoker.b_calls.load(Ordering::SeqCst), 0);
    assert_eq!(handoffs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn half_confirmed_payload_needs_one_more_trip() {
    let handoffs = Arc::new(AtomicUsize::new(0));
    let invoker = Arc::new(ConfirmationInvoker::new());
    let runner = Runner::new(confirmation_graph(handoffs.clone()), invoker.clone());

    let prompt = format!("partial {STAGE_ONE}");
    let outcome = runner.start("a", prompt, None).outcome().await;

    let RunOutcome::Success { output, .. } = outcome else {
        panic!("expected success");
    };
    assert_eq!(
        output,
        Some(Value::String(format!("partial {STAGE_ONE} {STAGE_TWO}")))
    );
    assert_eq!(invoker.b_calls.load(Ordering::SeqCst), 1);
    assert_eq!(handoffs.load(Ordering::SeqCst), 2);
}
