//! Accept-or-clarify outcomes for the extractor/judge collaboration.
//!
//! An extractor produces a best-effort structured object; a judge decides
//! between exactly two outcomes. `Accept` forwards the object unchanged to
//! the next stage. `Clarify` carries field-level issues back to the
//! caller-facing worker as a normal payload; it is never an error. The
//! deterministic half of a judge's policy, presence and cross-field checks,
//! is [`evaluate_completeness`]; a judge worker's instructions may add
//! quality checks on top, but the decoded outcome always takes one of these
//! two shapes.

use miette::Diagnostic;
use serde_json::{Value, json};
use thiserror::Error;

use crate::contract::{FieldIssue, OutputContract};

const OUTCOME_FIELD: &str = "outcome";
const OBJECT_FIELD: &str = "object";
const ISSUES_FIELD: &str = "issues";

/// A judge worker's decision over an extracted object.
#[derive(Clone, Debug, PartialEq)]
pub enum JudgeOutcome {
    /// The object is complete and internally consistent; forward unchanged.
    Accept(Value),
    /// The object is incomplete or invalid; each issue names a field.
    Clarify(Vec<FieldIssue>),
}

impl JudgeOutcome {
    #[must_use]
    pub fn is_accept(&self) -> bool {
        matches!(self, JudgeOutcome::Accept(_))
    }

    /// Renders a caller-facing clarification request from the issues.
    ///
    /// Only meaningful for `Clarify`; `Accept` renders an empty string.
    #[must_use]
    pub fn clarification_text(&self) -> String {
        match self {
            JudgeOutcome::Accept(_) => String::new(),
            JudgeOutcome::Clarify(issues) => {
                let lines: Vec<String> = issues.iter().map(ToString::to_string).collect();
                format!("I need a bit more information: {}", lines.join("; "))
            }
        }
    }

    /// Encodes the outcome as the structured value a judge worker emits.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            JudgeOutcome::Accept(object) => json!({
                "outcome": "accept",
                "object": object,
            }),
            JudgeOutcome::Clarify(issues) => json!({
                "outcome": "clarify",
                "issues": issues,
            }),
        }
    }

    /// Decodes a judge worker's structured output.
    ///
    /// A clarify outcome with no issues is malformed: a clarification must
    /// name at least one specific field, never a generic "something is
    /// wrong".
    pub fn from_value(value: &Value) -> Result<Self, JudgeDecodeError> {
        let object = value.as_object().ok_or(JudgeDecodeError::NotAnObject)?;
        let outcome = object
            .get(OUTCOME_FIELD)
            .and_then(Value::as_str)
            .ok_or(JudgeDecodeError::MissingOutcome)?;
        match outcome {
            "accept" => {
                let accepted = object
                    .get(OBJECT_FIELD)
                    .filter(|v| !v.is_null())
                    .ok_or(JudgeDecodeError::MissingObject)?;
                Ok(JudgeOutcome::Accept(accepted.clone()))
            }
            "clarify" => {
                let issues: Vec<FieldIssue> = object
                    .get(ISSUES_FIELD)
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|_| JudgeDecodeError::MalformedIssues)?
                    .unwrap_or_default();
                if issues.is_empty() {
                    return Err(JudgeDecodeError::EmptyClarification);
                }
                Ok(JudgeOutcome::Clarify(issues))
            }
            other => Err(JudgeDecodeError::UnknownOutcome {
                outcome: other.to_string(),
            }),
        }
    }
}

/// Decodes-side failures of the judge protocol.
#[derive(Debug, Error, Diagnostic)]
pub enum JudgeDecodeError {
    #[error("judge output is not a JSON object")]
    #[diagnostic(code(baton::judge::not_object))]
    NotAnObject,

    #[error("judge output is missing the 'outcome' field")]
    #[diagnostic(code(baton::judge::missing_outcome))]
    MissingOutcome,

    #[error("accept outcome carries no object")]
    #[diagnostic(code(baton::judge::missing_object))]
    MissingObject,

    #[error("clarify outcome carries malformed issues")]
    #[diagnostic(code(baton::judge::malformed_issues))]
    MalformedIssues,

    #[error("clarify outcome names no fields")]
    #[diagnostic(
        code(baton::judge::empty_clarification),
        help("A clarification must name at least one missing or invalid field.")
    )]
    EmptyClarification,

    #[error("unknown judge outcome '{outcome}'")]
    #[diagnostic(code(baton::judge::unknown_outcome))]
    UnknownOutcome { outcome: String },
}

/// Deterministic completeness decision over a candidate object.
///
/// Accepts when every contract check passes; otherwise clarifies with the
/// exact field-level issues. Because contract checks are pure, evaluating
/// an already-accepted object accepts it again.
#[must_use]
pub fn evaluate_completeness(contract: &OutputContract, candidate: &Value) -> JudgeOutcome {
    let issues = contract.check(candidate);
    if issues.is_empty() {
        JudgeOutcome::Accept(candidate.clone())
    } else {
        JudgeOutcome::Clarify(issues)
    }
}
