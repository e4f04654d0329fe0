//! Validate config command implementation

use super::EXIT_CONFIG_ERROR;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates, including rule compilation
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let schema = config.anonymization.build_schema()?;

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Anonymization: {}",
            if config.anonymization.enabled { "enabled" } else { "DISABLED" }
        );
        println!(
            "  Debug Mode: {}",
            if config.anonymization.debug { "ON" } else { "OFF" }
        );
        println!("  Max Depth: {}", config.anonymization.max_depth);
        println!(
            "  Identifier Rules: {} ({} from configuration)",
            schema.len(),
            config.anonymization.rules.len()
        );
        println!(
            "  File Logging: {}",
            if config.logging.local_enabled {
                format!("{} ({})", config.logging.local_path, config.logging.local_rotation)
            } else {
                "off".to_string()
            }
        );
        println!();

        if !config.anonymization.enabled {
            println!("⚠️  Anonymization is disabled: student data will reach the AI assistant unchanged");
            println!();
        }

        Ok(0)
    }
}
