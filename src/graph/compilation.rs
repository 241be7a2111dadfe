//! Graph compilation and structural validation.
//!
//! Everything that can be caught before a run starts is caught here: an
//! edge naming an unregistered endpoint or a configured guardrail with no
//! backing worker never survives to traversal time.

use miette::Diagnostic;
use thiserror::Error;

use super::WorkerGraph;
use super::builder::GraphBuilder;
use crate::types::WorkerId;

/// Structural problems detected at compile time.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("graph has no registered workers")]
    #[diagnostic(
        code(baton::graph::empty),
        help("Register at least one worker with add_worker before compiling.")
    )]
    Empty,

    #[error("handoff source '{from}' is not a registered worker")]
    #[diagnostic(code(baton::graph::unknown_source))]
    UnknownSource { from: WorkerId },

    #[error("handoff from '{from}' targets unregistered worker '{to}'")]
    #[diagnostic(
        code(baton::graph::unknown_target),
        help("Every handoff target must be registered with add_worker.")
    )]
    UnknownTarget { from: WorkerId, to: WorkerId },

    #[error("configured guardrail '{worker}' is not a registered worker")]
    #[diagnostic(code(baton::graph::unknown_guardrail))]
    UnknownGuardrail { worker: WorkerId },
}

impl GraphBuilder {
    /// Compiles the builder into an executable [`WorkerGraph`].
    ///
    /// Validation performed:
    /// - at least one worker is registered
    /// - every edge's source and target name registered workers
    /// - a configured guardrail worker is registered
    ///
    /// Cycles are deliberately not rejected; confirmation loops depend on
    /// them, and loop termination is worker policy.
    pub fn compile(self) -> Result<WorkerGraph, GraphError> {
        if self.workers.is_empty() {
            return Err(GraphError::Empty);
        }
        for edges in self.edges.values() {
            for edge in edges {
                if !self.workers.contains_key(&edge.from) {
                    return Err(GraphError::UnknownSource {
                        from: edge.from.clone(),
                    });
                }
                if !self.workers.contains_key(&edge.to) {
                    return Err(GraphError::UnknownTarget {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                    });
                }
            }
        }
        if let Some(guardrail) = &self.config.guardrail {
            if !self.workers.contains_key(guardrail) {
                return Err(GraphError::UnknownGuardrail {
                    worker: guardrail.clone(),
                });
            }
        }
        Ok(WorkerGraph::from_parts(
            self.workers,
            self.edges,
            self.config,
        ))
    }
}
