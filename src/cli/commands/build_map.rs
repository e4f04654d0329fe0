//! Build-map command implementation
//!
//! Seeds a course's pseudonym map from a roster file and prints the assignments
//! for review. Nothing is written to disk.

use super::{
    context_from_args, load_anonymizer, read_json, OutputFormat, EXIT_ANONYMIZATION_REFUSED,
    EXIT_CONFIG_ERROR, EXIT_FATAL,
};
use crate::anonymization::{BuildMode, MapBuilder};
use crate::log_error_with_context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the build-map command
#[derive(Args, Debug)]
pub struct BuildMapArgs {
    /// Canvas course identifier
    #[arg(long)]
    pub course: String,

    /// Optional session identifier
    #[arg(long)]
    pub session: Option<String>,

    /// Discard the existing map before seeding
    #[arg(long)]
    pub rebuild: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Roster file: JSON array of names or Canvas user objects
    pub roster: PathBuf,
}

impl BuildMapArgs {
    fn mode(&self) -> BuildMode {
        if self.rebuild {
            BuildMode::Rebuild
        } else {
            BuildMode::Extend
        }
    }

    /// Execute the build-map command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(course = %self.course, rebuild = self.rebuild, "Building anonymization map");

        let (_, anonymizer) = match load_anonymizer(config_path) {
            Ok(loaded) => loaded,
            Err(code) => return Ok(code),
        };

        let context = match context_from_args(&self.course, self.session.as_deref()) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let roster = match read_json(&self.roster) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("❌ {e:#}");
                return Ok(EXIT_FATAL);
            }
        };

        let map = match MapBuilder::for_anonymizer(&anonymizer).build_map(&context, &roster, self.mode()) {
            Ok(m) => m,
            Err(e) => {
                log_error_with_context!(&e, "Roster rejected");
                eprintln!("❌ Roster rejected: {e}");
                return Ok(EXIT_ANONYMIZATION_REFUSED);
            }
        };

        match self.format {
            OutputFormat::Console => print!("{}", map.format_console()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&map)?),
        }

        Ok(0)
    }
}
