//! Domain error types
//!
//! This module defines the error hierarchy for canvas-shield. Library code returns
//! [`ShieldError`]; the anonymization subsystem has its own [`AnonymizationError`]
//! which converts into it. Error messages never carry raw student identifiers.

use crate::anonymization::models::IdentifierTag;
use thiserror::Error;

/// Main canvas-shield error type
#[derive(Debug, Error)]
pub enum ShieldError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Anonymization failures. Payloads that hit one of these are withheld.
    #[error("Anonymization error: {0}")]
    Anonymization(#[from] AnonymizationError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised by the anonymization subsystem
///
/// Every variant is recoverable for the caller; none of them ends the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnonymizationError {
    /// Traversal went past the configured depth bound
    #[error("structure too deep: exceeded {max_depth} levels at '{path}'")]
    StructureTooDeep {
        /// Configured maximum depth
        max_depth: usize,
        /// Dotted path of the first node past the bound
        path: String,
    },

    /// A seed entry disagrees with a mapping the registry already holds
    #[error("conflicting {tag} mapping: already bound to '{existing}', seed requested '{requested}'")]
    ConflictingMapping {
        /// Tag of the conflicting entry
        tag: IdentifierTag,
        /// Pseudonym currently recorded
        existing: String,
        /// Pseudonym the seed asked for
        requested: String,
    },

    /// An identifier rule could not be parsed
    #[error("invalid identifier rule '{pattern}': {reason}")]
    InvalidRule {
        /// The offending pattern text
        pattern: String,
        /// Why it was rejected
        reason: String,
    },

    /// Two rules classify the same path differently
    #[error("identifier rules overlap with different classifications: '{pattern}'")]
    OverlappingRules {
        /// The duplicated pattern text
        pattern: String,
    },

    /// Roster input had an unusable shape
    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    /// Course or session identifier was empty
    #[error("invalid context: {0}")]
    InvalidContext(String),

    /// A replacement could not be written back at the identifier's location
    #[error("failed to write replacement at '{path}'")]
    WriteBackFailed {
        /// Dotted path of the identifier
        path: String,
    },
}

impl From<std::io::Error> for ShieldError {
    fn from(err: std::io::Error) -> Self {
        ShieldError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ShieldError {
    fn from(err: serde_json::Error) -> Self {
        ShieldError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for ShieldError {
    fn from(err: toml::de::Error) -> Self {
        ShieldError::Configuration(format!("TOML parsing error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shield_error_display() {
        let err = ShieldError::Configuration("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_anonymization_error_conversion() {
        let err: ShieldError = AnonymizationError::StructureTooDeep {
            max_depth: 4,
            path: "a.b.c.d.e".to_string(),
        }
        .into();
        assert!(matches!(err, ShieldError::Anonymization(_)));
        assert!(err.to_string().contains("exceeded 4 levels"));
    }

    #[test]
    fn test_conflicting_mapping_message_omits_raw_identifier() {
        let err = AnonymizationError::ConflictingMapping {
            tag: IdentifierTag::Name,
            existing: "Student_001".to_string(),
            requested: "Student_007".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("Student_001"));
        assert!(message.contains("Student_007"));
        assert!(message.contains("name"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: ShieldError = json_err.into();
        assert!(matches!(err, ShieldError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: ShieldError = toml_err.into();
        assert!(matches!(err, ShieldError::Configuration(_)));
    }

    #[test]
    fn test_shield_error_implements_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<ShieldError>();
        assert_error::<AnonymizationError>();
    }
}
