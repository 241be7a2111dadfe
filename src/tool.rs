//! The external capability boundary workers may call through.
//!
//! A [`Tool`] is an opaque async function from JSON args to a JSON result:
//! a web search, a file write, anything outside the engine. Tools are
//! attached to workers at graph-build time and resolved by name when a
//! worker's output requests a call. The engine treats every failure mode
//! here as an upstream failure of the run; it never retries on its own.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

/// An external capability callable by a worker.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use baton::tool::{Tool, ToolError};
/// use serde_json::{json, Value};
///
/// struct EchoTool;
///
/// #[async_trait]
/// impl Tool for EchoTool {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     async fn call(&self, args: Value) -> Result<Value, ToolError> {
///         Ok(json!({"echoed": args}))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name workers use to request this tool.
    fn name(&self) -> &str;

    /// Execute the tool. The caller suspends until the result returns.
    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

/// Failure modes of the tool boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum ToolError {
    /// The tool ran and reported a failure.
    #[error("tool '{tool}' failed: {message}")]
    #[diagnostic(code(baton::tool::failed))]
    Failed { tool: String, message: String },

    /// The backing service could not be reached.
    #[error("tool '{tool}' unavailable: {message}")]
    #[diagnostic(
        code(baton::tool::unavailable),
        help("Check connectivity to the backing service.")
    )]
    Unavailable { tool: String, message: String },

    /// The call exceeded the boundary's time budget.
    #[error("tool '{tool}' timed out")]
    #[diagnostic(code(baton::tool::timeout))]
    Timeout { tool: String },
}
