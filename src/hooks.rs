//! Lifecycle observers attached to individual workers.
//!
//! Hooks are publish/subscribe lists fired by the engine at fixed points of
//! a worker's turn: start, end, handoff, tool start, tool end. Subscribers
//! receive references and return nothing, so they can log, count, or mirror
//! state elsewhere but can never steer the run.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::types::WorkerId;

/// Observer fired when a worker's turn begins, with the turn input.
pub type StartObserver = Arc<dyn Fn(&WorkerId, &Value) + Send + Sync>;
/// Observer fired when a worker ends its turn with a final output.
pub type EndObserver = Arc<dyn Fn(&WorkerId, &Value) + Send + Sync>;
/// Observer fired when control passes from one worker to another.
pub type HandoffObserver = Arc<dyn Fn(&WorkerId, &WorkerId, &Value) + Send + Sync>;
/// Observer fired around tool calls, with the tool name and its args/result.
pub type ToolObserver = Arc<dyn Fn(&WorkerId, &str, &Value) + Send + Sync>;

/// Subscriber lists for one worker's lifecycle notifications.
///
/// # Examples
///
/// ```rust
/// use baton::hooks::WorkerHooks;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let started = Arc::new(AtomicUsize::new(0));
/// let counter = started.clone();
///
/// let mut hooks = WorkerHooks::new();
/// hooks.on_start(move |_, _| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// hooks.notify_start(&"parser".into(), &serde_json::json!("hello"));
/// assert_eq!(started.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone, Default)]
pub struct WorkerHooks {
    start: Vec<StartObserver>,
    end: Vec<EndObserver>,
    handoff: Vec<HandoffObserver>,
    tool_start: Vec<ToolObserver>,
    tool_end: Vec<ToolObserver>,
}

impl WorkerHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to turn-start notifications.
    pub fn on_start(&mut self, f: impl Fn(&WorkerId, &Value) + Send + Sync + 'static) {
        self.start.push(Arc::new(f));
    }

    /// Subscribe to turn-end notifications.
    pub fn on_end(&mut self, f: impl Fn(&WorkerId, &Value) + Send + Sync + 'static) {
        self.end.push(Arc::new(f));
    }

    /// Subscribe to handoff notifications (source, target, payload).
    pub fn on_handoff(&mut self, f: impl Fn(&WorkerId, &WorkerId, &Value) + Send + Sync + 'static) {
        self.handoff.push(Arc::new(f));
    }

    /// Subscribe to tool-start notifications (worker, tool, args).
    pub fn on_tool_start(&mut self, f: impl Fn(&WorkerId, &str, &Value) + Send + Sync + 'static) {
        self.tool_start.push(Arc::new(f));
    }

    /// Subscribe to tool-end notifications (worker, tool, result).
    pub fn on_tool_end(&mut self, f: impl Fn(&WorkerId, &str, &Value) + Send + Sync + 'static) {
        self.tool_end.push(Arc::new(f));
    }

    pub fn notify_start(&self, worker: &WorkerId, input: &Value) {
        for observer in &self.start {
            observer(worker, input);
        }
    }

    pub fn notify_end(&self, worker: &WorkerId, output: &Value) {
        for observer in &self.end {
            observer(worker, output);
        }
    }

    pub fn notify_handoff(&self, from: &WorkerId, to: &WorkerId, payload: &Value) {
        for observer in &self.handoff {
            observer(from, to, payload);
        }
    }

    pub fn notify_tool_start(&self, worker: &WorkerId, tool: &str, args: &Value) {
        for observer in &self.tool_start {
            observer(worker, tool, args);
        }
    }

    pub fn notify_tool_end(&self, worker: &WorkerId, tool: &str, result: &Value) {
        for observer in &self.tool_end {
            observer(worker, tool, result);
        }
    }
}

impl fmt::Debug for WorkerHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHooks")
            .field("start", &self.start.len())
            .field("end", &self.end.len())
            .field("handoff", &self.handoff.len())
            .field("tool_start", &self.tool_start.len())
            .field("tool_end", &self.tool_end.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn every_subscriber_is_notified() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut hooks = WorkerHooks::new();
        for _ in 0..3 {
            let count = count.clone();
            hooks.on_start(move |_, _| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        hooks.notify_start(&"w".into(), &json!(null));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn handoff_observer_sees_endpoints_and_payload() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let sink = seen.clone();
        let mut hooks = WorkerHooks::new();
        hooks.on_handoff(move |from, to, payload| {
            *sink.lock() = Some((from.clone(), to.clone(), payload.clone()));
        });
        hooks.notify_handoff(&"a".into(), &"b".into(), &json!({"k": 1}));
        let captured = seen.lock().clone().unwrap();
        assert_eq!(captured.0.as_str(), "a");
        assert_eq!(captured.1.as_str(), "b");
        assert_eq!(captured.2, json!({"k": 1}));
    }

    #[test]
    fn empty_hooks_are_silent() {
        let hooks = WorkerHooks::new();
        hooks.notify_end(&"w".into(), &json!(1));
        hooks.notify_tool_start(&"w".into(), "search", &json!({}));
        hooks.notify_tool_end(&"w".into(), "search", &json!([]));
    }
}
