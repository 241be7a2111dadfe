//! GraphBuilder implementation for constructing worker graphs.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::edges::HandoffEdge;
use crate::runtime::RunnerConfig;
use crate::types::WorkerId;
use crate::worker::Worker;

/// Builder for worker graphs with a fluent API.
///
/// Workers are registered first; handoff edges are attached afterwards,
/// including back-edges that close cycles. [`compile`](Self::compile)
/// validates that every edge endpoint is a registered worker and freezes
/// the result into an executable
/// [`WorkerGraph`](super::WorkerGraph).
///
/// # Examples
///
/// ```rust
/// use baton::graph::GraphBuilder;
/// use baton::worker::Worker;
///
/// let graph = GraphBuilder::new()
///     .add_worker(Worker::builder("parser").build())
///     .add_worker(Worker::builder("search").build())
///     .add_handoff("parser", "search")
///     .compile()
///     .expect("valid graph");
///
/// assert!(graph.edge(&"parser".into(), &"search".into()).is_some());
/// ```
pub struct GraphBuilder {
    /// Registry of all workers, keyed by their identifier.
    pub(super) workers: FxHashMap<WorkerId, Arc<Worker>>,
    /// Outgoing handoff edges per source worker.
    pub(super) edges: FxHashMap<WorkerId, Vec<HandoffEdge>>,
    /// Runtime configuration for the compiled graph.
    pub(super) config: RunnerConfig,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new, empty graph builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            workers: FxHashMap::default(),
            edges: FxHashMap::default(),
            config: RunnerConfig::default(),
        }
    }

    /// Registers a worker, keyed by its name.
    ///
    /// Registering a second worker under the same name replaces the first;
    /// a warning is emitted since that is usually a build mistake.
    #[must_use]
    pub fn add_worker(mut self, worker: Worker) -> Self {
        let id = worker.name().clone();
        if self.workers.insert(id.clone(), Arc::new(worker)).is_some() {
            tracing::warn!(worker = %id, "replacing previously registered worker");
        }
        self
    }

    /// Adds a bare handoff edge between two workers.
    ///
    /// Both endpoints must be registered by the time
    /// [`compile`](Self::compile) runs; the order of `add_worker` and edge
    /// calls is otherwise free.
    #[must_use]
    pub fn add_handoff(self, from: impl Into<WorkerId>, to: impl Into<WorkerId>) -> Self {
        self.add_handoff_edge(HandoffEdge::new(from, to))
    }

    /// Adds a fully configured handoff edge (transform and/or observer).
    #[must_use]
    pub fn add_handoff_edge(mut self, edge: HandoffEdge) -> Self {
        self.edges.entry(edge.from.clone()).or_default().push(edge);
        self
    }

    /// Sets the runtime configuration carried into the compiled graph.
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Iterates over registered worker ids.
    pub fn workers(&self) -> impl Iterator<Item = &WorkerId> {
        self.workers.keys()
    }

    /// Iterates over registered edges as `(from, to)` pairs.
    pub fn handoffs(&self) -> impl Iterator<Item = (&WorkerId, &WorkerId)> {
        self.edges
            .values()
            .flat_map(|edges| edges.iter().map(|e| (&e.from, &e.to)))
    }
}
