//! Worker descriptions: the immutable units the graph is built from.
//!
//! A [`Worker`] is pure description, not behavior: a unique name, an
//! instruction blob the engine never interprets, an optional output
//! contract, an optional tool set, and lifecycle hooks. Behavior comes from
//! the injected [`WorkerInvoker`](crate::invoker::WorkerInvoker), which
//! turns a worker plus input into an output. Workers are created once at
//! graph-build time and shared read-only across every run.
//!
//! Outgoing handoff targets deliberately live on the graph, not here, so
//! the topology stays inspectable without touching worker internals.
//!
//! # Examples
//!
//! ```rust
//! use baton::contract::{FieldKind, OutputContract};
//! use baton::worker::Worker;
//!
//! let extractor = Worker::builder("query-parser")
//!     .instructions("Extract origin, destination and dates from the request.")
//!     .contract(
//!         OutputContract::new()
//!             .required("origin", FieldKind::String)
//!             .required("destination", FieldKind::String),
//!     )
//!     .build();
//!
//! assert_eq!(extractor.name().as_str(), "query-parser");
//! assert!(extractor.contract().is_some());
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::contract::OutputContract;
use crate::hooks::WorkerHooks;
use crate::tool::Tool;
use crate::types::WorkerId;

/// A named, instruction-driven unit of the worker graph.
///
/// Immutable after [`WorkerBuilder::build`]; wrap in `Arc` to share.
pub struct Worker {
    name: WorkerId,
    instructions: String,
    contract: Option<OutputContract>,
    tools: Vec<Arc<dyn Tool>>,
    hooks: WorkerHooks,
}

impl Worker {
    /// Starts building a worker with the given name.
    #[must_use]
    pub fn builder(name: impl Into<WorkerId>) -> WorkerBuilder {
        WorkerBuilder {
            name: name.into(),
            instructions: String::new(),
            contract: None,
            tools: Vec::new(),
            hooks: WorkerHooks::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &WorkerId {
        &self.name
    }

    /// The policy blob handed verbatim to the invoker. Opaque to the engine.
    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// The contract a terminal structured result must satisfy, if declared.
    #[must_use]
    pub fn contract(&self) -> Option<&OutputContract> {
        self.contract.as_ref()
    }

    #[must_use]
    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Resolves a tool by the name a worker output refers to it with.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn hooks(&self) -> &WorkerHooks {
        &self.hooks
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("contract", &self.contract.is_some())
            .field("tools", &self.tools.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Fluent construction of a [`Worker`].
pub struct WorkerBuilder {
    name: WorkerId,
    instructions: String,
    contract: Option<OutputContract>,
    tools: Vec<Arc<dyn Tool>>,
    hooks: WorkerHooks,
}

impl WorkerBuilder {
    /// Sets the instruction blob driving the worker's behavior.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Declares the contract the worker's structured output must satisfy.
    #[must_use]
    pub fn contract(mut self, contract: OutputContract) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Attaches a callable tool.
    #[must_use]
    pub fn tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Attaches an already-shared tool.
    #[must_use]
    pub fn tool_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Subscribes a turn-start observer.
    #[must_use]
    pub fn on_start(mut self, f: impl Fn(&WorkerId, &Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_start(f);
        self
    }

    /// Subscribes a turn-end observer.
    #[must_use]
    pub fn on_end(mut self, f: impl Fn(&WorkerId, &Value) + Send + Sync + 'static) -> Self {
        self.hooks.on_end(f);
        self
    }

    /// Subscribes a handoff observer.
    #[must_use]
    pub fn on_handoff(
        mut self,
        f: impl Fn(&WorkerId, &WorkerId, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_handoff(f);
        self
    }

    /// Subscribes a tool-start observer.
    #[must_use]
    pub fn on_tool_start(
        mut self,
        f: impl Fn(&WorkerId, &str, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_tool_start(f);
        self
    }

    /// Subscribes a tool-end observer.
    #[must_use]
    pub fn on_tool_end(
        mut self,
        f: impl Fn(&WorkerId, &str, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_tool_end(f);
        self
    }

    /// Finalizes the description.
    #[must_use]
    pub fn build(self) -> Worker {
        Worker {
            name: self.name,
            instructions: self.instructions,
            contract: self.contract,
            tools: self.tools,
            hooks: self.hooks,
        }
    }
}
