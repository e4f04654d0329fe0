//! Anonymization configuration

use crate::anonymization::schema::{IdentifierSchema, RuleDefinition};
use crate::anonymization::traversal::DEFAULT_MAX_DEPTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Anonymization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Enable/disable anonymization
    #[serde(default)]
    pub enabled: bool,

    /// Embed the original value next to each pseudonym (local auditing only)
    #[serde(default)]
    pub debug: bool,

    /// Nesting bound for payload traversal
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Operator rules appended to the built-in Canvas catalog
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debug: false,
            max_depth: default_max_depth(),
            rules: Vec::new(),
        }
    }
}

impl AnonymizationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            anyhow::bail!("anonymization.max_depth must be greater than 0");
        }

        self.build_schema()
            .context("Invalid anonymization rules")?;

        Ok(())
    }

    /// Compiles the built-in catalog plus configured rules
    pub fn build_schema(&self) -> Result<IdentifierSchema> {
        Ok(IdentifierSchema::canvas_with_extra_rules(&self.rules)?)
    }

    /// Apply environment variable overrides
    ///
    /// `CANVAS_SHIELD_ANONYMIZATION_*` variables take precedence over the bare
    /// `ENABLE_DATA_ANONYMIZATION` / `ANONYMIZATION_DEBUG` names.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        for name in ["ENABLE_DATA_ANONYMIZATION", "CANVAS_SHIELD_ANONYMIZATION_ENABLED"] {
            if let Ok(val) = std::env::var(name) {
                self.enabled = parse_flag(&val).with_context(|| format!("Invalid {name} value"))?;
            }
        }

        for name in ["ANONYMIZATION_DEBUG", "CANVAS_SHIELD_ANONYMIZATION_DEBUG"] {
            if let Ok(val) = std::env::var(name) {
                self.debug = parse_flag(&val).with_context(|| format!("Invalid {name} value"))?;
            }
        }

        if let Ok(val) = std::env::var("CANVAS_SHIELD_ANONYMIZATION_MAX_DEPTH") {
            self.max_depth = val
                .parse()
                .context("Invalid CANVAS_SHIELD_ANONYMIZATION_MAX_DEPTH value")?;
        }

        Ok(())
    }
}

/// Parses a boolean flag the way deployment environments tend to spell it
fn parse_flag(val: &str) -> Result<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_default_config() {
        let config = AnonymizationConfig::default();
        assert!(!config.enabled);
        assert!(!config.debug);
        assert_eq!(config.max_depth, 64);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let config = AnonymizationConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = AnonymizationConfig {
            max_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_rule_rejected() {
        let config = AnonymizationConfig {
            rules: vec![RuleDefinition {
                pattern: "**.{peer".to_string(),
                tag: "name".to_string(),
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_rules() {
        let config: AnonymizationConfig = toml::from_str(
            r#"
            enabled = true

            [[rules]]
            pattern = "**.peer_reviewer"
            tag = "name"
            "#,
        )
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.max_depth, 64);
        assert_eq!(config.rules.len(), 1);
        assert!(config.build_schema().is_ok());
    }

    #[test_case("true", true)]
    #[test_case("TRUE", true)]
    #[test_case("1", true)]
    #[test_case("yes", true)]
    #[test_case("false", false)]
    #[test_case("0", false)]
    #[test_case("off", false)]
    fn test_parse_flag(input: &str, expected: bool) {
        assert_eq!(parse_flag(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_flag_rejects_garbage() {
        assert!(parse_flag("maybe").is_err());
    }
}
