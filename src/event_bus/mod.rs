//! Observability bus for run lifecycle events.
//!
//! Every hook notification, tool call, handoff traversal, streamed fragment
//! and run termination is mirrored here as an [`Event`]. A background
//! listener broadcasts events to pluggable [`EventSink`]s: stdout for
//! development, memory for tests, a channel for live consumers. Sinks are
//! side-effect only; the engine never reads the bus.

mod bus;
mod event;
mod sink;

pub use bus::EventBus;
pub use event::Event;
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};
