//! Caller-facing run surface: the event stream, the terminal outcome, and
//! the fragment sink handed to invokers.
//!
//! Each run owns one ordered channel of [`RunEvent`]s: zero or more text
//! fragments in generation order, then exactly one terminal marker. The
//! terminal outcome is also resolved through [`RunHandle::outcome`] for
//! callers that only care about the end state. Dropping the handle
//! disconnects the channel; the engine notices between steps and abandons
//! the run (best-effort cancellation, in-flight invocations are not
//! preempted).

use futures_util::Stream;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::session::ContinuationToken;
use crate::event_bus::Event;
use crate::types::WorkerId;

/// One frame of a run's output stream.
///
/// The sequence for a run is always `Fragment* (End | Error)`, mirroring the
/// wire contract of `{text}` frames closed by a single `{type: "end"}` or
/// error frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEvent {
    /// One unit of incrementally produced text.
    Fragment(String),
    /// Successful termination; the token resumes this conversation later.
    End {
        continuation: Option<ContinuationToken>,
    },
    /// Rejected or failed termination with a caller-facing message.
    Error { message: String },
}

/// Terminal state of a run.
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    /// The graph produced a final result.
    Success {
        /// Final structured value, or the final text wrapped as a JSON
        /// string when the last worker produced prose only.
        output: Option<Value>,
        continuation: Option<ContinuationToken>,
    },
    /// The guardrail gate declined the request. A defined outcome, not an
    /// error.
    Rejected { explanation: String },
    /// Contract violation, upstream failure, or graph misconfiguration. The
    /// cause is logged; the message here is generic.
    Failed { message: String },
}

impl RunOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, RunOutcome::Rejected { .. })
    }
}

/// Raised by [`FragmentSink::emit`] when the caller has gone away.
#[derive(Debug, Error, Diagnostic)]
#[error("fragment stream closed by the caller")]
#[diagnostic(
    code(baton::run::stream_closed),
    help("The run handle was dropped; stop producing output.")
)]
pub struct FragmentStreamClosed;

/// Ordered fragment emitter handed to the invoker through the invocation
/// context.
///
/// Fragments land on the run's event channel in emission order and are
/// mirrored onto the observability bus.
#[derive(Clone)]
pub struct FragmentSink {
    worker: WorkerId,
    run_tx: flume::Sender<RunEvent>,
    bus_tx: flume::Sender<Event>,
}

impl FragmentSink {
    pub(crate) fn new(
        worker: WorkerId,
        run_tx: flume::Sender<RunEvent>,
        bus_tx: flume::Sender<Event>,
    ) -> Self {
        Self {
            worker,
            run_tx,
            bus_tx,
        }
    }

    /// Emit one text fragment to the caller.
    pub fn emit(&self, chunk: impl Into<String>) -> Result<(), FragmentStreamClosed> {
        let chunk = chunk.into();
        let _ = self
            .bus_tx
            .send(Event::fragment(self.worker.clone(), chunk.clone()));
        self.run_tx
            .send(RunEvent::Fragment(chunk))
            .map_err(|_| FragmentStreamClosed)
    }
}

impl std::fmt::Debug for FragmentSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentSink")
            .field("worker", &self.worker)
            .finish()
    }
}

/// Caller handle for one orchestration run.
///
/// # Examples
///
/// ```rust,no_run
/// # use baton::runtime::{RunEvent, RunHandle};
/// # async fn example(handle: RunHandle) {
/// let mut handle = handle;
/// while let Some(event) = handle.next_event().await {
///     match event {
///         RunEvent::Fragment(text) => print!("{text}"),
///         RunEvent::End { continuation } => {
///             println!("\ndone; resume with {continuation:?}");
///         }
///         RunEvent::Error { message } => eprintln!("{message}"),
///     }
/// }
/// # }
/// ```
pub struct RunHandle {
    run_id: String,
    events: flume::Receiver<RunEvent>,
    outcome: oneshot::Receiver<RunOutcome>,
    task: JoinHandle<()>,
}

impl RunHandle {
    pub(crate) fn new(
        run_id: String,
        events: flume::Receiver<RunEvent>,
        outcome: oneshot::Receiver<RunOutcome>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            run_id,
            events,
            outcome,
            task,
        }
    }

    /// Unique id of this run, stable across its events.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Next event in arrival order, or `None` once the stream is closed.
    ///
    /// The stream is forward-only and finite: after the terminal marker the
    /// channel closes and this returns `None` forever.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv_async().await.ok()
    }

    /// Adapts the event channel into a `futures` stream.
    #[must_use]
    pub fn into_stream(self) -> impl Stream<Item = RunEvent> + Send {
        self.events.into_stream()
    }

    /// Awaits the terminal outcome.
    ///
    /// Events not yet consumed are dropped; use [`collect_text`] or drain
    /// [`next_event`] first when the streamed text matters.
    ///
    /// [`collect_text`]: Self::collect_text
    pub async fn outcome(self) -> RunOutcome {
        self.outcome.await.unwrap_or(RunOutcome::Failed {
            message: "run ended without reporting an outcome".to_string(),
        })
    }

    /// Drains the stream, concatenating fragments, then resolves the
    /// outcome. Convenience for callers that want the whole text at once.
    pub async fn collect_text(mut self) -> (String, RunOutcome) {
        let mut text = String::new();
        while let Some(event) = self.next_event().await {
            if let RunEvent::Fragment(chunk) = event {
                text.push_str(&chunk);
            }
        }
        (text, self.outcome().await)
    }

    /// Eagerly stop the run. Delivery ceases; the in-flight step is
    /// cancelled at its next await point.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunHandle")
            .field("run_id", &self.run_id)
            .finish()
    }
}
