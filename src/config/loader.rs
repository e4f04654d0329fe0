//! Configuration file loading
//!
//! Reads `canvas-shield.toml`, substitutes `${VAR}` placeholders, applies
//! environment overrides, and validates the result.

use super::schema::ShieldConfig;
use crate::domain::errors::ShieldError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads and validates a configuration file
///
/// # Errors
///
/// Returns [`ShieldError::Configuration`] when the file is missing or unreadable,
/// a referenced environment variable is unset, the TOML is malformed, an override
/// cannot be parsed, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<ShieldConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ShieldError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ShieldError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Loads a configuration file, falling back to defaults when it does not exist
///
/// Environment overrides still apply to the defaults, so a gateway can be driven
/// entirely by `ENABLE_DATA_ANONYMIZATION` and friends.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<ShieldConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(path = %path.display(), "No configuration file, using defaults");
    let mut config = ShieldConfig::default();
    finish(&mut config)?;
    Ok(config)
}

/// Parses configuration text
pub fn parse_config(contents: &str) -> Result<ShieldConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ShieldConfig = toml::from_str(&contents)
        .map_err(|e| ShieldError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    finish(&mut config)?;
    Ok(config)
}

fn finish(config: &mut ShieldConfig) -> Result<()> {
    apply_env_overrides(config)?;

    config.validate().map_err(|e| {
        ShieldError::Configuration(format!("Configuration validation failed: {}", e))
    })
}

/// Replaces `${VAR}` placeholders with environment values
///
/// Comment lines are left untouched. All missing variables are reported at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ShieldError::Configuration(format!("Invalid placeholder pattern: {}", e)))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ShieldError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies `CANVAS_SHIELD_*` overrides
fn apply_env_overrides(config: &mut ShieldConfig) -> Result<()> {
    if let Ok(val) = std::env::var("CANVAS_SHIELD_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    config
        .anonymization
        .apply_env_overrides()
        .map_err(|e| ShieldError::Configuration(format!("{e:#}")))?;

    if let Ok(val) = std::env::var("CANVAS_SHIELD_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("CANVAS_SHIELD_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("CANVAS_SHIELD_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
