//! Flights pipeline demo: guardrail gate, extractor, completeness judge,
//! tool-calling search, renderer. Model and tool boundaries are scripted
//! fakes so the demo runs offline; the orchestration engine is the real
//! one.
//!
//! Run with: cargo run --example flights

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use baton::contract::{CrossFieldRule, FieldKind, OutputContract};
use baton::graph::{GraphBuilder, HandoffEdge, WorkerGraph};
use baton::invoker::{
    InvocationContext, InvokeError, ToolCall, WorkerInvoker, WorkerOutput,
};
use baton::judge::{JudgeOutcome, evaluate_completeness};
use baton::message::Message;
use baton::runtime::{RunEvent, Runner, RunnerConfig};
use baton::tool::{Tool, ToolError};
use baton::worker::Worker;

const REJECTION: &str =
    "This assistant only answers flights questions. Try asking about flights!";

fn flight_contract() -> OutputContract {
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

struct FakeSearchTool;

#[async_trait]
impl Tool for FakeSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    async fn call(&self, _args: Value) -> Result<Value, ToolError> {
        Ok(json!([
            {"title": "YWG-LGA nonstop", "price": "$412"},
            {"title": "YWG-JFK one stop", "price": "$388"},
            {"title": "YWG-EWR red-eye", "price": "$365"},
        ]))
    }
}

/// Scripted stand-in for the model behind every worker.
struct DemoInvoker;

#[async_trait]
impl WorkerInvoker for DemoInvoker {
    async fn invoke(
        &self,
        worker: &Worker,
        input: &Value,
        ctx: &InvocationContext,
    ) -> Result<WorkerOutput, InvokeError> {
        match worker.name().as_str() {
            "flights-filter" => {
                let prompt = input["prompt"].as_str().unwrap_or_default();
                let is_flights = prompt.contains("fly") || prompt.contains("flight");
                let verdict = if is_flights {
                    json!({"in_domain": true})
                } else {
                    json!({"in_domain": false, "explanation": REJECTION})
                };
                Ok(WorkerOutput::structured(verdict))
            }
            "flights" => match input {
                Value::String(prompt) => {
                    Ok(WorkerOutput::handoff("query-parser", json!(prompt)))
                }
                clarify => {
                    let outcome = JudgeOutcome::from_value(clarify).map_err(|e| {
                        InvokeError::MalformedOutput {
                            detail: e.to_string(),
                        }
                    })?;
                    Ok(WorkerOutput::text(outcome.clarification_text()))
                }
            },
            "query-parser" => {
                let prompt = input.as_str().unwrap_or_default();
                // A real model would reply with fenced JSON; recover the
                // object the same way an invoker implementation would.
                let raw = if prompt.contains("xmass") {
                    "```json\n{\"origin\": \"Winnipeg\", \"destination\": \"New York\", \
                     \"departureDate\": \"2025-12-25\", \"returnDate\": \"2026-01-08\"}\n```"
                } else if prompt.contains("ny") {
                    "```json\n{\"destination\": \"New York\"}\n```"
                } else {
                    "```json\n{}\n```"
                };
                let query = baton::utils::parse_structured(raw).ok_or_else(|| {
                    InvokeError::MalformedOutput {
                        detail: "extraction was not valid JSON".to_string(),
                    }
                })?;
                Ok(WorkerOutput::handoff("query-judge", query))
            }
            "query-judge" => match evaluate_completeness(&flight_contract(), input) {
                JudgeOutcome::Accept(query) => Ok(WorkerOutput::handoff("search", query)),
                clarify => Ok(WorkerOutput::handoff("flights", clarify.to_value())),
            },
            "search" => {
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
                        let results: Value = serde_json::from_str(&raw).map_err(|e| {
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
    }
}

fn build_graph() -> WorkerGraph {
    GraphBuilder::new()
        .add_worker(Worker::builder("flights-filter").build())
        .add_worker(Worker::builder("flights").build())
        .add_worker(Worker::builder("query-parser").build())
        .add_worker(Worker::builder("query-judge").build())
        .add_worker(Worker::builder("search").tool(FakeSearchTool).build())
        .add_worker(Worker::builder("web-renderer").build())
        .add_handoff("flights", "query-parser")
        .add_handoff("query-parser", "query-judge")
        .add_handoff_edge(
            HandoffEdge::new("query-judge", "search")
                .with_transform(flight_contract())
                .with_observer(Arc::new(|from, to, payload| {
                    println!(">>> {from} -> {to}: {payload}");
                })),
        )
        .add_handoff("query-judge", "flights")
        .add_handoff_edge(
            HandoffEdge::new("search", "web-renderer")
                .with_transform(OutputContract::new().required("results", FieldKind::Array)),
        )
        .with_config(
            RunnerConfig::default()
                .with_guardrail("flights-filter")
                .with_rejection_message(REJECTION),
        )
        .compile()
        .expect("demo graph is valid")
}

async fn run_prompt(runner: &Runner, prompt: &str) {
    println!("\n=== {prompt}");
    let mut handle = runner.start("flights", prompt, None);
    while let Some(event) = handle.next_event().await {
        match event {
            RunEvent::Fragment(text) => print!("{text}"),
            RunEvent::End { continuation } => {
                println!("\n(end, continuation: {continuation:?})");
            }
            RunEvent::Error { message } => println!("(declined: {message})"),
        }
    }
}

#[tokio::main]
async fn main() {
    baton::telemetry::init();
    let runner = Runner::new(build_graph(), Arc::new(DemoInvoker));

    run_prompt(
        &runner,
        "fly to ny from winnipeg, on xmass and return 2 weeks later",
    )
    .await;
    run_prompt(&runner, "fly to ny").await;
    run_prompt(&runner, "what's the weather today").await;
}
