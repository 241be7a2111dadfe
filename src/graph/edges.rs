//! Handoff edges: directed, typed transitions between workers.

use crate::contract::OutputContract;
use crate::hooks::HandoffObserver;
use crate::types::WorkerId;

/// A directed handoff relation `from -> to`.
///
/// An edge may carry an input-transform contract, applied to the payload
/// before the target becomes active (a mismatch is fatal to the run), and
/// an observer fired when the edge is traversed. Edges are attached to
/// already-registered workers, and nothing forbids back-edges: confirmation
/// loops are a 2-cycle by construction.
#[derive(Clone)]
pub struct HandoffEdge {
    pub from: WorkerId,
    pub to: WorkerId,
    /// Contract the forwarded payload must satisfy, if any.
    pub transform: Option<OutputContract>,
    /// Fired with (source, target, transformed payload) on traversal.
    pub observer: Option<HandoffObserver>,
}

impl HandoffEdge {
    /// A bare edge with no transform and no observer.
    #[must_use]
    pub fn new(from: impl Into<WorkerId>, to: impl Into<WorkerId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            transform: None,
            observer: None,
        }
    }

    /// Requires the forwarded payload to satisfy `contract`.
    #[must_use]
    pub fn with_transform(mut self, contract: OutputContract) -> Self {
        self.transform = Some(contract);
        self
    }

    /// Attaches a traversal observer. Observers are side-effect only.
    #[must_use]
    pub fn with_observer(mut self, observer: HandoffObserver) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl std::fmt::Debug for HandoffEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffEdge")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("transform", &self.transform.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
