//! End-to-end scenarios over the flights topology: a guardrail gate, a
//! caller-facing triage worker, an extractor, a completeness judge, a
//! tool-calling search worker, and a renderer. All behavior is scripted
//! through deterministic fakes at the invoker and tool boundaries; the
//! engine under test is the real one.

mod common;

use std::sync::Arc;

use serde_json::{Value, json};

use baton::contract::{FieldKind, OutputContract};
use baton::graph::{GraphBuilder, HandoffEdge, WorkerGraph};
use baton::invoker::{InvokeError, ToolCall, WorkerOutput};
use baton::judge::{JudgeOutcome, evaluate_completeness};
use baton::message::Message;
use baton::runtime::{RunOutcome, Runner, RunnerConfig};
use baton::worker::Worker;

use common::{FixedTool, FnInvoker, drain, flight_contract, verdict};

const REJECTION: &str =
    "This assistant only answers flights questions. Try asking about flights!";

fn search_results() -> Value {
    json!({
        "results": [
            {"title": "YWG-LGA nonstop", "price": "$412", "url": "https://air.example/1"},
            {"title": "YWG-JFK one stop", "price": "$388", "url": "https://air.example/2"},
            {"title": "YWG-EWR red-eye", "price": "$365", "url": "https://air.example/3"},
        ]
    })
}

/// Deterministic stand-in for the extractor model.
fn extract_query(prompt: &str) -> Value {
    if prompt.contains("xmass") && prompt.contains("return 2 weeks later") {
        json!({
            "origin": "Winnipeg",
            "destination": "New York",
            "departureDate": "2025-12-25",
            "returnDate": "2026-01-08",
        })
    } else if prompt.contains("ny") {
        // Destination only; everything else is missing.
        json!({"destination": "New York"})
    } else {
        json!({})
    }
}

fn flights_graph() -> WorkerGraph {
    let results_contract = OutputContract::new().required("results", FieldKind::Array);

    GraphBuilder::new()
        .add_worker(Worker::builder("flights-filter").build())
        .add_worker(Worker::builder("flights").build())
        .add_worker(Worker::builder("query-parser").build())
        .add_worker(Worker::builder("query-judge").build())
        .add_worker(
            Worker::builder("search")
                .tool(FixedTool::new("web_search", search_results()["results"].clone()))
                .build(),
        )
        .add_worker(Worker::builder("web-renderer").build())
        .add_handoff("flights", "query-parser")
        .add_handoff("query-parser", "query-judge")
        // Accept path carries a fully validated flight query.
        .add_handoff_edge(
            HandoffEdge::new("query-judge", "search").with_transform(flight_contract()),
        )
        // Clarify path returns to the caller-facing worker.
        .add_handoff("query-judge", "flights")
        .add_handoff_edge(
            HandoffEdge::new("search", "web-renderer").with_transform(results_contract),
        )
        .with_config(
            RunnerConfig::default()
                .with_guardrail("flights-filter")
                .with_rejection_message(REJECTION),
        )
        .compile()
        .unwrap()
}

fn flights_invoker() -> FnInvoker<
    impl Fn(
        &baton::worker::Worker,
        &Value,
        &baton::invoker::InvocationContext,
    ) -> Result<WorkerOutput, InvokeError>
    + Send
    + Sync,
> {
    FnInvoker::new(|worker, input, ctx| {
        match worker.name().as_str() {
            "flights-filter" => {
                let prompt = input["prompt"].as_str().unwrap_or_default();
                let is_flights = prompt.contains("fly") || prompt.contains("flight");
                Ok(WorkerOutput::structured(verdict(
                    is_flights,
                    (!is_flights).then_some(REJECTION),
                )))
            }
            "flights" => match input {
                // First visit: the raw prompt goes to the extractor.
                Value::String(prompt) => {
                    Ok(WorkerOutput::handoff("query-parser", json!(prompt)))
                }
                // Return visit: a clarify payload becomes caller guidance.
                other => {
                    let outcome = JudgeOutcome::from_value(other).map_err(|e| {
                        InvokeError::MalformedOutput {
                            detail: e.to_string(),
                        }
                    })?;
                    Ok(WorkerOutput::text(outcome.clarification_text()))
                }
            },
            "query-parser" => {
                let prompt = input.as_str().unwrap_or_default();
                Ok(WorkerOutput::handoff("query-judge", extract_query(prompt)))
            }
            "query-judge" => {
                let outcome = evaluate_completeness(&common::flight_contract(), input);
                match outcome {
                    JudgeOutcome::Accept(query) => {
                        Ok(WorkerOutput::handoff("search", query))
                    }
                    clarify => Ok(WorkerOutput::handoff("flights", clarify.to_value())),
                }
            }
            "search" => {
                // The tool result arrives through the history; request the
                // call on the first pass.
                let tool_result = ctx
                    .history()
                    .iter()
                    .rev()
                    .find(|m| m.has_role(Message::TOOL))
                    .map(|m| m.content.clone());
                match tool_result {
                    None => Ok(WorkerOutput::tool_calls(vec![ToolCall::new(
                        "web_search",
                        input.clone(),
                    )])),
                    Some(raw) => {
                        let results: Value =
                            serde_json::from_str(&raw).map_err(|e| {
                                InvokeError::MalformedOutput {
                                    detail: e.to_string(),
                                }
                            })?;
                        Ok(WorkerOutput::handoff(
                            "web-renderer",
                            json!({"results": results}),
                        ))
                    }
                }
            }
            "web-renderer" => {
                let count = input["results"].as_array().map_or(0, Vec::len);
                ctx.emit_fragment("I ").ok();
                ctx.emit_fragment("found ").ok();
                ctx.emit_fragment(format!("{count} ")).ok();
                ctx.emit_fragment("flights").ok();
                Ok(WorkerOutput::text(format!("I found {count} flights")))
            }
            other => Err(InvokeError::Unavailable {
                message: format!("unexpected worker '{other}'"),
            }),
        }
    })
}

#[tokio::test]
async fn complete_query_flows_to_the_renderer() {
    let invoker = Arc::new(flights_invoker());
    let runner = Runner::new(flights_graph(), invoker.clone());

    let handle = runner.start(
        "flights",
        "fly to ny from winnipeg, on xmass and return 2 weeks later",
        None,
    );
    let (events, outcome) = drain(handle).await;

    let RunOutcome::Success { output, .. } = outcome else {
        panic!("expected success, got a non-success terminal");
    };
    assert_eq!(output, Some(Value::String("I found 3 flights".into())));
    assert_eq!(
        common::fragments(&events),
        vec!["I ", "found ", "3 ", "flights"]
    );

    let order: Vec<String> = invoker
        .calls()
        .iter()
        .map(|w| w.as_str().to_string())
        .collect();
    assert_eq!(
        order,
        vec![
            "flights-filter",
            "flights",
            "query-parser",
            "query-judge",
            "search",  // requests the tool
            "search",  // consumes the tool result
            "web-renderer",
        ]
    );
}

#[tokio::test]
async fn accepted_object_is_forwarded_unchanged() {
    let forwarded: Arc<parking_lot::Mutex<Option<Value>>> =
        Arc::new(parking_lot::Mutex::new(None));
    let sink = forwarded.clone();

    // Same graph, plus an observer on the accept edge.
    let graph = {
        let results_contract = OutputContract::new().required("results", FieldKind::Array);
        GraphBuilder::new()
            .add_worker(Worker::builder("flights-filter").build())
            .add_worker(Worker::builder("flights").build())
            .add_worker(Worker::builder("query-parser").build())
            .add_worker(Worker::builder("query-judge").build())
            .add_worker(
                Worker::builder("search")
                    .tool(FixedTool::new(
                        "web_search",
                        search_results()["results"].clone(),
                    ))
                    .build(),
            )
            .add_worker(Worker::builder("web-renderer").build())
            .add_handoff("flights", "query-parser")
            .add_handoff("query-parser", "query-judge")
            .add_handoff_edge(
                HandoffEdge::new("query-judge", "search")
                    .with_transform(flight_contract())
                    .with_observer(Arc::new(move |_, _, payload| {
                        *sink.lock() = Some(payload.clone());
                    })),
            )
            .add_handoff("query-judge", "flights")
            .add_handoff_edge(
                HandoffEdge::new("search", "web-renderer").with_transform(results_contract),
            )
            .with_config(RunnerConfig::default().with_guardrail("flights-filter"))
            .compile()
            .unwrap()
    };
    let runner = Runner::new(graph, Arc::new(flights_invoker()));

    let outcome = runner
        .start(
            "flights",
            "fly to ny from winnipeg, on xmass and return 2 weeks later",
            None,
        )
        .outcome()
        .await;
    assert!(outcome.is_success());

    assert_eq!(
        forwarded.lock().clone(),
        Some(json!({
            "origin": "Winnipeg",
            "destination": "New York",
            "departureDate": "2025-12-25",
            "returnDate": "2026-01-08",
        }))
    );
}

#[tokio::test]
async fn out_of_domain_prompt_is_rejected_before_the_graph() {
    let invoker = Arc::new(flights_invoker());
    let runner = Runner::new(flights_graph(), invoker.clone());

    let outcome = runner
        .start("flights", "what's the weather today", None)
        .outcome()
        .await;

    assert_eq!(
        outcome,
        RunOutcome::Rejected {
            explanation: REJECTION.to_string()
        }
    );
    // Only the gate ever ran.
    assert_eq!(invoker.count_for("flights-filter"), 1);
    for worker in ["flights", "query-parser", "query-judge", "search", "web-renderer"] {
        assert_eq!(invoker.count_for(worker), 0, "{worker} must not run");
    }
}

#[tokio::test]
async fn incomplete_query_clarifies_with_field_names() {
    let invoker = Arc::new(flights_invoker());
    let runner = Runner::new(flights_graph(), invoker.clone());

    let outcome = runner.start("flights", "fly to ny", None).outcome().await;

    let RunOutcome::Success { output, .. } = outcome else {
        panic!("clarification is a normal outcome, not an error");
    };
    let text = output
        .and_then(|v| v.as_str().map(ToString::to_string))
        .unwrap_or_default();
    // The clarification names the concrete missing fields.
    assert!(text.contains("origin"), "clarification was: {text}");
    assert!(text.contains("departureDate"), "clarification was: {text}");
    // The search stage never ran.
    assert_eq!(invoker.count_for("search"), 0);
}
