//! Init command implementation
//!
//! Generates a sample `canvas-shield.toml`.

use super::{EXIT_CONFIG_ERROR, EXIT_FATAL};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "canvas-shield.toml")]
    pub output: String,

    /// Include example rules and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing canvas-shield configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Review {} (anonymization is enabled)", self.output);
                println!("  2. Validate configuration: canvas-shield validate-config");
                println!("  3. Seed a course map: canvas-shield build-map --course <id> roster.json");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# canvas-shield configuration

[application]
log_level = "info"

[anonymization]
enabled = true
debug = false
max_depth = 64

[logging]
local_enabled = true
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples
    fn generate_config_with_examples() -> String {
        r#"# canvas-shield configuration
#
# Student identifiers in Canvas responses are replaced with per-course
# pseudonyms (Student_001, StudentEmail_001, ...) before they reach an AI
# assistant. Values like "${VAR_NAME}" are read from the environment.
#
# Environment overrides:
#   ENABLE_DATA_ANONYMIZATION=true|false
#   ANONYMIZATION_DEBUG=true|false
#   CANVAS_SHIELD_ANONYMIZATION_MAX_DEPTH=<n>
#   CANVAS_SHIELD_APPLICATION_LOG_LEVEL=<level>

[application]
# trace | debug | info | warn | error
log_level = "info"

[anonymization]
# Replace student identifiers. Disabling this sends real student data
# to the assistant and may violate FERPA.
enabled = true

# Embed the original value next to each pseudonym:
#   {"$anonymized": {"pseudonym": "Student_001", "original": "..."}}
# Local auditing only. Never enable in production.
debug = false

# Payloads nested deeper than this are refused
max_depth = 64

# Extra identifier rules, appended to the built-in Canvas catalog.
# Pattern segments: key, {a,b}, *, [] (array index, may suffix a key), **.
# Tags: name, login_id, sis_id, email, avatar_url, preserve.
#
# [[anonymization.rules]]
# pattern = "**.peer_reviewer.display_name"
# tag = "name"
#
# [[anonymization.rules]]
# pattern = "**.outcome.title"
# tag = "preserve"

[logging]
# JSON log files with rotation (daily | hourly | never)
local_enabled = true
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "canvas-shield.toml".to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.output, "canvas-shield.toml");
    }

    #[test]
    fn test_generate_minimal_config() {
        let config = parse_config(&InitArgs::generate_minimal_config()).unwrap();
        assert!(config.anonymization.enabled);
        assert_eq!(config.anonymization.max_depth, 64);
    }

    #[test]
    fn test_generate_config_with_examples() {
        let content = InitArgs::generate_config_with_examples();
        assert!(content.contains("[[anonymization.rules]]"));
        let config = parse_config(&content).unwrap();
        assert!(config.anonymization.rules.is_empty());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("canvas-shield.toml");
        std::fs::write(&output, "# existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG_ERROR);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "# existing");

        let forced = InitArgs { force: true, ..args };
        assert_eq!(forced.execute().await.unwrap(), 0);
        assert!(std::fs::read_to_string(&output).unwrap().contains("[anonymization]"));
    }
}
