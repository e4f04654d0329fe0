//! Configuration management
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! `canvas-shield.toml` supports:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for every setting
//! - `CANVAS_SHIELD_*` environment overrides, plus the gateway's
//!   `ENABLE_DATA_ANONYMIZATION` and `ANONYMIZATION_DEBUG` switches
//! - Validation on load, including compilation of operator identifier rules
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [anonymization]
//! enabled = true
//! debug = false
//! max_depth = 64
//!
//! [[anonymization.rules]]
//! pattern = "**.peer_reviewer.display_name"
//! tag = "name"
//!
//! [logging]
//! local_enabled = true
//! local_path = "${CANVAS_SHIELD_LOG_DIR}"
//! local_rotation = "daily"
//! ```
//!
//! # Loading
//!
//! ```rust,no_run
//! use canvas_shield::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("canvas-shield.toml")?;
//! println!("Anonymization enabled: {}", config.anonymization.enabled);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_or_default, parse_config};
pub use schema::{ApplicationConfig, LoggingConfig, ShieldConfig};

pub use crate::anonymization::config::AnonymizationConfig;
