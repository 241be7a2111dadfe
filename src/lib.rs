//! # Baton: Handoff-Driven Worker Orchestration
//!
//! Baton coordinates specialized, instruction-driven workers that cooperate
//! to turn one free-form request into a validated, structured result,
//! optionally streaming partial output back to the caller. Workers delegate
//! through explicit handoffs on a directed graph rather than a single
//! monolithic prompt.
//!
//! ## Core Concepts
//!
//! - **Workers**: Immutable descriptions (instructions, output contract,
//!   tools, hooks); behavior comes from an injected invoker
//! - **Handoffs**: Directed, typed transitions of control between workers,
//!   with optional input transforms and observers
//! - **Contracts**: Declarative validation gates between workers, with
//!   cross-field rules
//! - **Guardrail**: A gate worker that admits or declines a request before
//!   the main graph runs
//! - **Runs**: One state machine per request, streaming fragments in
//!   generation order and ending in exactly one terminal
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use baton::graph::GraphBuilder;
//! use baton::invoker::WorkerInvoker;
//! use baton::runtime::{Runner, RunnerConfig};
//! use baton::worker::Worker;
//!
//! # async fn example(invoker: Arc<dyn WorkerInvoker>) -> Result<(), Box<dyn std::error::Error>> {
//! let graph = GraphBuilder::new()
//!     .add_worker(Worker::builder("gate").build())
//!     .add_worker(Worker::builder("triage").build())
//!     .add_worker(Worker::builder("parser").build())
//!     .add_handoff("triage", "parser")
//!     .add_handoff("parser", "triage")
//!     .with_config(RunnerConfig::default().with_guardrail("gate"))
//!     .compile()?;
//!
//! let runner = Runner::new(graph, invoker);
//! let handle = runner.start("triage", "fly to ny from winnipeg", None);
//! let (text, outcome) = handle.collect_text().await;
//! println!("{text} -> {outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Boundaries
//!
//! The language-model call and external tools are injected dependencies
//! behind [`invoker::WorkerInvoker`] and [`tool::Tool`]. The engine's
//! control flow is fully testable by substituting deterministic fakes at
//! those seams.
//!
//! ## Module Guide
//!
//! - [`worker`] - Worker descriptions and the fluent builder
//! - [`graph`] - Graph construction, handoff edges, compile-time validation
//! - [`contract`] - Declarative output contracts and cross-field rules
//! - [`guardrail`] / [`judge`] - The two built-in gate protocols
//! - [`invoker`] / [`tool`] - The injected model and tool boundaries
//! - [`runtime`] - The engine, run handles, sessions, configuration
//! - [`event_bus`] / [`telemetry`] - Observability plumbing

pub mod contract;
pub mod event_bus;
pub mod graph;
pub mod guardrail;
pub mod hooks;
pub mod invoker;
pub mod judge;
pub mod message;
pub mod runtime;
pub mod telemetry;
pub mod tool;
pub mod types;
pub mod utils;
pub mod worker;
