//! Replacement values written into sanitized payloads

use serde_json::{json, Value};

/// Key marking a debug composite in sanitized output
pub const DEBUG_MARKER: &str = "$anonymized";

/// Value that takes the place of an identifying leaf
#[derive(Debug, Clone, PartialEq)]
pub enum Replacement {
    /// Production output: the pseudonym alone
    Pseudonymized(String),
    /// Local auditing output: pseudonym plus the original value
    ///
    /// Must never leave the trust boundary.
    PseudonymizedWithDebugOriginal {
        /// Assigned pseudonym
        pseudonym: String,
        /// Value that was replaced
        original: Value,
    },
}

impl Replacement {
    /// Pseudonym carried by this replacement
    pub fn pseudonym(&self) -> &str {
        match self {
            Self::Pseudonymized(pseudonym) => pseudonym,
            Self::PseudonymizedWithDebugOriginal { pseudonym, .. } => pseudonym,
        }
    }

    /// Whether this is debug output
    pub fn is_debug(&self) -> bool {
        matches!(self, Self::PseudonymizedWithDebugOriginal { .. })
    }

    /// JSON form written into the payload
    ///
    /// Production output is a plain string. Debug output is
    /// `{"$anonymized": {"pseudonym": ..., "original": ...}}`.
    pub fn into_value(self) -> Value {
        match self {
            Self::Pseudonymized(pseudonym) => Value::String(pseudonym),
            Self::PseudonymizedWithDebugOriginal {
                pseudonym,
                original,
            } => json!({
                DEBUG_MARKER: {
                    "pseudonym": pseudonym,
                    "original": original,
                }
            }),
        }
    }

    /// Recognizes a debug composite produced by [`Replacement::into_value`]
    pub fn from_debug_value(value: &Value) -> Option<Self> {
        let inner = value.as_object()?.get(DEBUG_MARKER)?.as_object()?;
        let pseudonym = inner.get("pseudonym")?.as_str()?.to_string();
        let original = inner.get("original")?.clone();
        Some(Self::PseudonymizedWithDebugOriginal {
            pseudonym,
            original,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_value_is_plain_string() {
        let replacement = Replacement::Pseudonymized("Student_001".to_string());
        assert!(!replacement.is_debug());
        assert_eq!(replacement.into_value(), json!("Student_001"));
    }

    #[test]
    fn test_debug_value_shape() {
        let replacement = Replacement::PseudonymizedWithDebugOriginal {
            pseudonym: "Student_001".to_string(),
            original: json!("Alice Smith"),
        };
        let value = replacement.clone().into_value();
        assert_eq!(
            value,
            json!({"$anonymized": {"pseudonym": "Student_001", "original": "Alice Smith"}})
        );
        assert_eq!(Replacement::from_debug_value(&value), Some(replacement));
        assert_eq!(Replacement::from_debug_value(&json!("Student_001")), None);
    }
}
