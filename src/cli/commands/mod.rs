//! CLI command implementations
//!
//! Exit codes: 0 success, 2 configuration error, 3 anonymization refused,
//! 5 fatal error.

pub mod build_map;
pub mod init;
pub mod sanitize;
pub mod status;
pub mod validate;

use crate::anonymization::{Anonymizer, PseudonymRegistry};
use crate::config::{load_config_or_default, ShieldConfig};
use crate::domain::errors::AnonymizationError;
use crate::domain::ids::CourseIdentityContext;
use anyhow::Context;
use clap::ValueEnum;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Configuration error exit code
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Anonymization refused exit code
pub const EXIT_ANONYMIZATION_REFUSED: i32 = 3;
/// Fatal error exit code
pub const EXIT_FATAL: i32 = 5;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console output
    #[default]
    Console,
    /// Pretty-printed JSON
    Json,
}

/// Loads configuration and builds an anonymizer over a fresh registry
///
/// Prints the failure and returns the exit code on error.
pub(crate) fn load_anonymizer(config_path: &str) -> Result<(ShieldConfig, Anonymizer), i32> {
    let config = match load_config_or_default(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to load configuration");
            eprintln!("   Error: {e}");
            return Err(EXIT_CONFIG_ERROR);
        }
    };

    let registry = Arc::new(PseudonymRegistry::new());
    match Anonymizer::new(config.anonymization.clone(), registry) {
        Ok(anonymizer) => Ok((config, anonymizer)),
        Err(e) => {
            eprintln!("❌ Failed to initialize anonymization");
            eprintln!("   Error: {e}");
            Err(EXIT_CONFIG_ERROR)
        }
    }
}

/// Builds the identity context from CLI arguments
pub(crate) fn context_from_args(
    course: &str,
    session: Option<&str>,
) -> Result<CourseIdentityContext, AnonymizationError> {
    match session {
        Some(session) => CourseIdentityContext::for_session(course, session),
        None => CourseIdentityContext::for_course(course),
    }
}

/// Reads and parses a JSON file
pub(crate) fn read_json(path: impl AsRef<Path>) -> anyhow::Result<Value> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_context_from_args() {
        let ctx = context_from_args("course-101", Some("fall")).unwrap();
        assert_eq!(ctx.to_string(), "course-101#fall");
        assert!(context_from_args("  ", None).is_err());
    }

    #[test]
    fn test_read_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"user": {"name": "Alice"}}"#).unwrap();
        let value = read_json(file.path()).unwrap();
        assert_eq!(value["user"]["name"], "Alice");

        let mut bad = NamedTempFile::new().unwrap();
        bad.write_all(b"{not json").unwrap();
        assert!(read_json(bad.path()).is_err());
    }
}
