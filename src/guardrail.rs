//! The guardrail gate: admit or decline a request before the main graph.
//!
//! The gate is an ordinary worker whose output contract is a boolean-like
//! verdict. The engine invokes it once per run with the raw prompt and, on
//! follow-up turns, the resumed conversation, so a follow-up is judged in
//! context rather than in isolation. A negative verdict is a deliberate
//! early exit with a caller-facing explanation, not an error.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::contract::{ContractViolation, FieldKind, OutputContract};

/// Field carrying the boolean verdict.
pub const IN_DOMAIN_FIELD: &str = "in_domain";
/// Optional field carrying the caller-facing explanation.
pub const EXPLANATION_FIELD: &str = "explanation";

/// The contract a guardrail worker's structured output must satisfy.
#[must_use]
pub fn verdict_contract() -> OutputContract {
    OutputContract::new()
        .required(IN_DOMAIN_FIELD, FieldKind::Bool)
        .optional(EXPLANATION_FIELD, FieldKind::String)
}

/// Decoded guardrail verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub in_domain: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl GuardrailVerdict {
    /// A verdict admitting the request.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            in_domain: true,
            explanation: None,
        }
    }

    /// A verdict declining the request with an explanation.
    #[must_use]
    pub fn decline(explanation: impl Into<String>) -> Self {
        Self {
            in_domain: false,
            explanation: Some(explanation.into()),
        }
    }

    /// Decodes a verdict from a worker's structured output.
    ///
    /// The value is validated against [`verdict_contract`] first, so a gate
    /// emitting the wrong shape is a contract violation, not a silent pass.
    pub fn from_value(value: &Value) -> Result<Self, ContractViolation> {
        let validated = verdict_contract().validate(value.clone())?;
        Ok(Self {
            in_domain: validated[IN_DOMAIN_FIELD].as_bool().unwrap_or(false),
            explanation: validated[EXPLANATION_FIELD]
                .as_str()
                .map(ToString::to_string),
        })
    }

    /// Encodes the verdict as the structured value a fake or real gate
    /// worker would emit.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match &self.explanation {
            Some(explanation) => json!({
                "in_domain": self.in_domain,
                "explanation": explanation,
            }),
            None => json!({"in_domain": self.in_domain}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_round_trip() {
        let verdict = GuardrailVerdict::decline("flights only");
        let decoded = GuardrailVerdict::from_value(&verdict.to_value()).unwrap();
        assert_eq!(decoded, verdict);
    }

    #[test]
    fn allow_has_no_explanation() {
        let decoded = GuardrailVerdict::from_value(&json!({"in_domain": true})).unwrap();
        assert!(decoded.in_domain);
        assert!(decoded.explanation.is_none());
    }

    #[test]
    fn missing_verdict_field_is_a_violation() {
        let err = GuardrailVerdict::from_value(&json!({"explanation": "hm"})).unwrap_err();
        assert!(err.issues.iter().any(|i| i.field == IN_DOMAIN_FIELD));
    }

    #[test]
    fn non_boolean_verdict_is_a_violation() {
        assert!(GuardrailVerdict::from_value(&json!({"in_domain": "yes"})).is_err());
    }
}
