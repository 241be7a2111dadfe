use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::WorkerId;

/// Observability event emitted while a run walks the worker graph.
///
/// Events mirror the lifecycle notifications the engine fires (worker
/// start/end, handoffs, tool calls), the text fragments streamed to the
/// caller, and run termination. They are consumed by
/// [`EventSink`](super::EventSink)s; nothing in the engine reads them back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Event {
    WorkerStart {
        worker: WorkerId,
        turn: u64,
        when: DateTime<Utc>,
    },
    WorkerEnd {
        worker: WorkerId,
        turn: u64,
        when: DateTime<Utc>,
    },
    Handoff {
        from: WorkerId,
        to: WorkerId,
        when: DateTime<Utc>,
    },
    ToolStart {
        worker: WorkerId,
        tool: String,
        when: DateTime<Utc>,
    },
    ToolEnd {
        worker: WorkerId,
        tool: String,
        when: DateTime<Utc>,
    },
    /// Mirror of one streamed text fragment.
    Fragment {
        worker: WorkerId,
        chunk: String,
        when: DateTime<Utc>,
    },
    /// Terminal marker for a run; `status` is `completed`, `rejected`, or
    /// `failed`.
    RunEnd {
        run_id: String,
        status: String,
        when: DateTime<Utc>,
    },
    /// Free-form diagnostic line.
    Diagnostic {
        scope: String,
        message: String,
        when: DateTime<Utc>,
    },
}

impl Event {
    pub fn worker_start(worker: WorkerId, turn: u64) -> Self {
        Event::WorkerStart {
            worker,
            turn,
            when: Utc::now(),
        }
    }

    pub fn worker_end(worker: WorkerId, turn: u64) -> Self {
        Event::WorkerEnd {
            worker,
            turn,
            when: Utc::now(),
        }
    }

    pub fn handoff(from: WorkerId, to: WorkerId) -> Self {
        Event::Handoff {
            from,
            to,
            when: Utc::now(),
        }
    }

    pub fn tool_start(worker: WorkerId, tool: impl Into<String>) -> Self {
        Event::ToolStart {
            worker,
            tool: tool.into(),
            when: Utc::now(),
        }
    }

    pub fn tool_end(worker: WorkerId, tool: impl Into<String>) -> Self {
        Event::ToolEnd {
            worker,
            tool: tool.into(),
            when: Utc::now(),
        }
    }

    pub fn fragment(worker: WorkerId, chunk: impl Into<String>) -> Self {
        Event::Fragment {
            worker,
            chunk: chunk.into(),
            when: Utc::now(),
        }
    }

    pub fn run_end(run_id: impl Into<String>, status: impl Into<String>) -> Self {
        Event::RunEnd {
            run_id: run_id.into(),
            status: status.into(),
            when: Utc::now(),
        }
    }

    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic {
            scope: scope.into(),
            message: message.into(),
            when: Utc::now(),
        }
    }

    /// Stable label identifying the event variant.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Event::WorkerStart { .. } => "worker_start",
            Event::WorkerEnd { .. } => "worker_end",
            Event::Handoff { .. } => "handoff",
            Event::ToolStart { .. } => "tool_start",
            Event::ToolEnd { .. } => "tool_end",
            Event::Fragment { .. } => "fragment",
            Event::RunEnd { .. } => "run_end",
            Event::Diagnostic { .. } => "diagnostic",
        }
    }

    /// Event timestamp.
    #[must_use]
    pub fn when(&self) -> DateTime<Utc> {
        match self {
            Event::WorkerStart { when, .. }
            | Event::WorkerEnd { when, .. }
            | Event::Handoff { when, .. }
            | Event::ToolStart { when, .. }
            | Event::ToolEnd { when, .. }
            | Event::Fragment { when, .. }
            | Event::RunEnd { when, .. }
            | Event::Diagnostic { when, .. } => *when,
        }
    }

    /// Convert the event to a normalized JSON object.
    ///
    /// The shape is `{"type": <label>, "timestamp": <rfc3339>, ...fields}`,
    /// suitable for wire transports and log pipelines.
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        let mut value = json!({
            "type": self.label(),
            "timestamp": self.when().to_rfc3339(),
        });
        let fields = match self {
            Event::WorkerStart { worker, turn, .. } | Event::WorkerEnd { worker, turn, .. } => {
                json!({"worker": worker, "turn": turn})
            }
            Event::Handoff { from, to, .. } => json!({"from": from, "to": to}),
            Event::ToolStart { worker, tool, .. } | Event::ToolEnd { worker, tool, .. } => {
                json!({"worker": worker, "tool": tool})
            }
            Event::Fragment { worker, chunk, .. } => json!({"worker": worker, "chunk": chunk}),
            Event::RunEnd { run_id, status, .. } => json!({"run_id": run_id, "status": status}),
            Event::Diagnostic { scope, message, .. } => {
                json!({"scope": scope, "message": message})
            }
        };
        if let (Some(target), Some(extra)) = (value.as_object_mut(), fields.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
        }
        value
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::WorkerStart { worker, turn, .. } => write!(f, "[{worker}@{turn}] started"),
            Event::WorkerEnd { worker, turn, .. } => write!(f, "[{worker}@{turn}] ended"),
            Event::Handoff { from, to, .. } => write!(f, "[{from}] handed off to {to}"),
            Event::ToolStart { worker, tool, .. } => write!(f, "[{worker}] started tool {tool}"),
            Event::ToolEnd { worker, tool, .. } => write!(f, "[{worker}] tool {tool} returned"),
            Event::Fragment { worker, chunk, .. } => write!(f, "[{worker}] {chunk}"),
            Event::RunEnd { run_id, status, .. } => write!(f, "run {run_id} {status}"),
            Event::Diagnostic { scope, message, .. } => write!(f, "[{scope}] {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_carries_variant_fields() {
        let event = Event::handoff("parser".into(), "search".into());
        let value = event.to_json_value();
        assert_eq!(value["type"], "handoff");
        assert_eq!(value["from"], "parser");
        assert_eq!(value["to"], "search");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn display_is_compact() {
        let event = Event::worker_start("judge".into(), 2);
        assert_eq!(event.to_string(), "[judge@2] started");
    }
}
