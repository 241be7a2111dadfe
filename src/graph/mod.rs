//! Worker graph definition and compilation.
//!
//! The graph is an explicit adjacency structure keyed by worker identity,
//! built once at startup and shared read-only across runs. Topology lives
//! here, not inside worker objects, so it stays inspectable and testable
//! independent of any single worker.
//!
//! # Quick Start
//!
//! ```rust
//! use baton::graph::{GraphBuilder, HandoffEdge};
//! use baton::worker::Worker;
//!
//! // A two-worker confirmation pair: A <-> B is a legal 2-cycle.
//! let graph = GraphBuilder::new()
//!     .add_worker(Worker::builder("a").build())
//!     .add_worker(Worker::builder("b").build())
//!     .add_handoff("a", "b")
//!     .add_handoff("b", "a")
//!     .compile()
//!     .expect("valid graph");
//!
//! assert_eq!(graph.len(), 2);
//! ```

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphError;
pub use edges::HandoffEdge;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::runtime::RunnerConfig;
use crate::types::WorkerId;
use crate::worker::Worker;

/// Compiled, immutable worker graph.
///
/// Produced by [`GraphBuilder::compile`]; shared across runs behind an
/// `Arc`. Lookups never mutate.
pub struct WorkerGraph {
    workers: FxHashMap<WorkerId, Arc<Worker>>,
    edges: FxHashMap<WorkerId, Vec<HandoffEdge>>,
    config: RunnerConfig,
}

impl WorkerGraph {
    pub(crate) fn from_parts(
        workers: FxHashMap<WorkerId, Arc<Worker>>,
        edges: FxHashMap<WorkerId, Vec<HandoffEdge>>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            workers,
            edges,
            config,
        }
    }

    /// Looks up a worker by id.
    #[must_use]
    pub fn worker(&self, id: &WorkerId) -> Option<&Arc<Worker>> {
        self.workers.get(id)
    }

    /// Returns the registered edge `from -> to`, if any.
    ///
    /// When several edges connect the same pair the first registered one
    /// wins; later duplicates would be unreachable anyway.
    #[must_use]
    pub fn edge(&self, from: &WorkerId, to: &WorkerId) -> Option<&HandoffEdge> {
        self.edges
            .get(from)
            .and_then(|edges| edges.iter().find(|e| &e.to == to))
    }

    /// All outgoing edges of a worker.
    #[must_use]
    pub fn edges_from(&self, from: &WorkerId) -> &[HandoffEdge] {
        self.edges.get(from).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, id: &WorkerId) -> bool {
        self.workers.contains_key(id)
    }

    /// Number of registered workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Runtime configuration attached at build time.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }
}

impl std::fmt::Debug for WorkerGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerGraph")
            .field("workers", &self.workers.len())
            .field(
                "edges",
                &self.edges.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}
