//! Declarative output contracts for structured worker results.
//!
//! A worker that promises structured output declares an [`OutputContract`]:
//! which fields must be present, what kind each field is, and which
//! cross-field rules must hold (a return date must not precede the
//! departure date, an origin must differ from a destination). The engine
//! evaluates contracts at the gates between workers; workers never
//! re-implement validation ad hoc.
//!
//! Validation is pure: it never mutates the candidate, so re-validating an
//! accepted value always accepts it again.
//!
//! # Examples
//!
//! ```rust
//! use baton::contract::{CrossFieldRule, FieldKind, OutputContract};
//! use serde_json::json;
//!
//! let contract = OutputContract::new()
//!     .required("origin", FieldKind::String)
//!     .required("destination", FieldKind::String)
//!     .required("departureDate", FieldKind::Date)
//!     .optional("returnDate", FieldKind::Date)
//!     .rule(CrossFieldRule::DateOrder {
//!         start: "departureDate".into(),
//!         end: "returnDate".into(),
//!     });
//!
//! let query = json!({
//!     "origin": "Winnipeg",
//!     "destination": "New York",
//!     "departureDate": "2025-12-25",
//!     "returnDate": "2026-01-08",
//! });
//! assert!(contract.check(&query).is_empty());
//! ```

use chrono::NaiveDate;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The structural kind a contract field must have.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Any JSON string.
    String,
    /// A JSON boolean.
    Bool,
    /// Any JSON number.
    Number,
    /// A string holding an ISO calendar date (`YYYY-MM-DD`).
    Date,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// A string restricted to one of the listed values.
    OneOf(Vec<String>),
}

impl FieldKind {
    fn describe(&self) -> String {
        match self {
            FieldKind::String => "a string".to_string(),
            FieldKind::Bool => "a boolean".to_string(),
            FieldKind::Number => "a number".to_string(),
            FieldKind::Date => "an ISO date (YYYY-MM-DD)".to_string(),
            FieldKind::Object => "an object".to_string(),
            FieldKind::Array => "an array".to_string(),
            FieldKind::OneOf(values) => format!("one of {values:?}"),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Number => value.is_number(),
            FieldKind::Date => value
                .as_str()
                .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
            FieldKind::OneOf(values) => value
                .as_str()
                .is_some_and(|s| values.iter().any(|v| v == s)),
        }
    }
}

/// One declared field of a contract.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// A predicate spanning more than one field.
///
/// Rules are evaluated only when every involved field is present and passed
/// its kind check; presence problems are reported by the field checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CrossFieldRule {
    /// `end` must not be an earlier date than `start`.
    DateOrder { start: String, end: String },
    /// The two fields must not hold the same value (case-insensitive for
    /// strings). Catches inputs like an identical origin and destination.
    Distinct { left: String, right: String },
}

/// A specific problem with one field of a candidate value.
///
/// Issues are deliberately field-level: a clarification built from them can
/// always name what is missing or invalid, never just "something is wrong".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub problem: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Raised when a candidate value fails its contract.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("output failed contract validation: {}", summarize(.issues))]
#[diagnostic(
    code(baton::contract::violation),
    help("Each issue names the offending field; fix or supply those fields.")
)]
pub struct ContractViolation {
    pub issues: Vec<FieldIssue>,
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Declarative contract over a structured output value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutputContract {
    fields: Vec<FieldSpec>,
    rules: Vec<CrossFieldRule>,
}

impl OutputContract {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field that must be present and of the given kind.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    /// Declares a field that may be absent or `null`, but must be of the
    /// given kind when present.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    /// Adds a cross-field rule to the contract.
    #[must_use]
    pub fn rule(mut self, rule: CrossFieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Declared fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Evaluates the candidate and returns every issue found.
    ///
    /// An empty result means the candidate conforms. `null` field values are
    /// treated as absent, matching how extractors emit unknown fields.
    #[must_use]
    pub fn check(&self, candidate: &Value) -> Vec<FieldIssue> {
        let Some(object) = candidate.as_object() else {
            return vec![FieldIssue::new("$", "expected a JSON object")];
        };

        let mut issues = Vec::new();
        for spec in &self.fields {
            match object.get(&spec.name).filter(|v| !v.is_null()) {
                None => {
                    if spec.required {
                        issues.push(FieldIssue::new(
                            spec.name.clone(),
                            "required field is missing",
                        ));
                    }
                }
                Some(value) => {
                    if !spec.kind.matches(value) {
                        issues.push(FieldIssue::new(
                            spec.name.clone(),
                            format!("expected {}", spec.kind.describe()),
                        ));
                    }
                }
            }
        }

        for rule in &self.rules {
            if let Some(issue) = self.check_rule(rule, object) {
                issues.push(issue);
            }
        }
        issues
    }

    /// Validates the candidate, returning it unchanged on success.
    pub fn validate(&self, candidate: Value) -> Result<Value, ContractViolation> {
        let issues = self.check(&candidate);
        if issues.is_empty() {
            Ok(candidate)
        } else {
            Err(ContractViolation { issues })
        }
    }

    fn check_rule(
        &self,
        rule: &CrossFieldRule,
        object: &serde_json::Map<String, Value>,
    ) -> Option<FieldIssue> {
        match rule {
            CrossFieldRule::DateOrder { start, end } => {
                let start_date = parse_date_field(object, start)?;
                let end_date = parse_date_field(object, end)?;
                (end_date < start_date).then(|| {
                    FieldIssue::new(end.clone(), format!("must not be earlier than {start}"))
                })
            }
            CrossFieldRule::Distinct { left, right } => {
                let lhs = object.get(left).filter(|v| !v.is_null())?;
                let rhs = object.get(right).filter(|v| !v.is_null())?;
                let equal = match (lhs.as_str(), rhs.as_str()) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    _ => lhs == rhs,
                };
                equal.then(|| {
                    FieldIssue::new(right.clone(), format!("must differ from {left}"))
                })
            }
        }
    }
}

fn parse_date_field(object: &serde_json::Map<String, Value>, name: &str) -> Option<NaiveDate> {
    object
        .get(name)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}
