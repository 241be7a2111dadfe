//! Core identifier types for the baton orchestration engine.
//!
//! A [`WorkerId`] names one worker inside a graph. Ids are plain strings
//! under the hood; the newtype keeps registry keys, handoff targets, and
//! event payloads from silently mixing with arbitrary text.
//!
//! # Examples
//!
//! ```rust
//! use baton::types::WorkerId;
//!
//! let parser = WorkerId::new("query-parser");
//! assert_eq!(parser.as_str(), "query-parser");
//!
//! // String literals convert where a WorkerId is expected.
//! let same: WorkerId = "query-parser".into();
//! assert_eq!(parser, same);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique name of a worker within a graph.
///
/// Ids are compared and hashed by their string content. They serialize as a
/// bare JSON string so handoff payloads and events stay readable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Creates a worker id from any string-like value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
