//! Rendering and tracing setup for baton's observability surface.
//!
//! [`TelemetryFormatter`] turns bus events into printable lines for sinks;
//! [`init`] wires a `tracing` subscriber with env-filter so internal causes
//! (contract violations, upstream failures) land in logs while callers only
//! see the generic failure message.

use std::io::IsTerminal;

use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::event_bus::Event;

pub const LINE_COLOR: &str = "\x1b[35m"; // magenta
pub const RESET_COLOR: &str = "\x1b[0m";

/// Formatter color mode for telemetry output.
///
/// - [`FormatterMode::Auto`]: detects TTY capability via `stderr.is_terminal()`
/// - [`FormatterMode::Colored`]: always include color codes
/// - [`FormatterMode::Plain`]: never include color codes (for logs/files)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatterMode {
    #[default]
    Auto,
    Colored,
    Plain,
}

impl FormatterMode {
    /// Returns true if this mode should use colored output.
    pub fn is_colored(&self) -> bool {
        match self {
            FormatterMode::Auto => std::io::stderr().is_terminal(),
            FormatterMode::Colored => true,
            FormatterMode::Plain => false,
        }
    }
}

/// Renders bus events for a sink.
pub trait TelemetryFormatter: Send + Sync {
    /// Render one event, newline included.
    fn render_event(&self, event: &Event) -> String;
}

/// Plain text formatter with optional ANSI color codes.
pub struct PlainFormatter {
    mode: FormatterMode,
}

impl PlainFormatter {
    /// Create a new formatter with auto-detected color mode.
    pub fn new() -> Self {
        Self {
            mode: FormatterMode::Auto,
        }
    }

    /// Create a new formatter with explicit color mode.
    pub fn with_mode(mode: FormatterMode) -> Self {
        Self { mode }
    }
}

impl Default for PlainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryFormatter for PlainFormatter {
    fn render_event(&self, event: &Event) -> String {
        if self.mode.is_colored() {
            format!("{LINE_COLOR}{event}{RESET_COLOR}\n")
        } else {
            format!("{event}\n")
        }
    }
}

/// JSON-lines formatter for machine-readable sinks.
#[derive(Default)]
pub struct JsonFormatter;

impl TelemetryFormatter for JsonFormatter {
    fn render_event(&self, event: &Event) -> String {
        format!("{}\n", event.to_json_value())
    }
}

/// Install a global tracing subscriber.
///
/// Filtering follows `RUST_LOG` (default `info`). Safe to call more than
/// once; only the first call installs.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(ErrorLayer::default())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_mode_has_no_ansi_codes() {
        let formatter = PlainFormatter::with_mode(FormatterMode::Plain);
        let rendered = formatter.render_event(&Event::worker_start("parser".into(), 0));
        assert!(!rendered.contains('\x1b'));
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn colored_mode_wraps_line() {
        let formatter = PlainFormatter::with_mode(FormatterMode::Colored);
        let rendered = formatter.render_event(&Event::worker_start("parser".into(), 0));
        assert!(rendered.starts_with(LINE_COLOR));
    }

    #[test]
    fn json_formatter_emits_one_object_per_line() {
        let rendered = JsonFormatter.render_event(&Event::diagnostic("scope", "msg"));
        let value: serde_json::Value = serde_json::from_str(rendered.trim()).unwrap();
        assert_eq!(value["type"], "diagnostic");
    }
}
