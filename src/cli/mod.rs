//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// canvas-shield - FERPA anonymization for Canvas LMS tool responses
#[derive(Parser, Debug)]
#[command(name = "canvas-shield")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "canvas-shield.toml", env = "CANVAS_SHIELD_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CANVAS_SHIELD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitize Canvas payload files
    Sanitize(commands::sanitize::SanitizeArgs),

    /// Seed a course's pseudonym map from a roster and print it
    BuildMap(commands::build_map::BuildMapArgs),

    /// Show anonymization status and mapping statistics
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["canvas-shield", "status"]);
        assert_eq!(cli.config, "canvas-shield.toml");
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["canvas-shield", "--config", "custom.toml", "status"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["canvas-shield", "--log-level", "debug", "status"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["canvas-shield", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["canvas-shield", "init", "--with-examples"]);
        assert!(matches!(cli.command, Commands::Init(ref args) if args.with_examples));
    }

    #[test]
    fn test_cli_parse_sanitize() {
        let cli = Cli::parse_from(["canvas-shield", "sanitize", "--course", "101", "x.json"]);
        assert!(matches!(cli.command, Commands::Sanitize(_)));
    }
}
