//! Sanitize command implementation
//!
//! Sanitizes Canvas payload files and prints the result to stdout. The report
//! goes to stderr so stdout stays valid JSON.

use super::{
    context_from_args, load_anonymizer, read_json, OutputFormat, EXIT_ANONYMIZATION_REFUSED,
    EXIT_CONFIG_ERROR, EXIT_FATAL,
};
use crate::anonymization::{BuildMode, MapBuilder, PayloadKind};
use crate::log_error_with_context;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the sanitize command
#[derive(Args, Debug)]
pub struct SanitizeArgs {
    /// Canvas course identifier
    #[arg(long)]
    pub course: String,

    /// Optional session identifier
    #[arg(long)]
    pub session: Option<String>,

    /// Payload kind (generic, users, submissions, discussions, groups)
    #[arg(long, default_value = "generic")]
    pub kind: PayloadKind,

    /// Roster to seed the map with before sanitizing
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub report_format: OutputFormat,

    /// Payload files (JSON)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl SanitizeArgs {
    /// Execute the sanitize command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(course = %self.course, kind = %self.kind, files = self.files.len(), "Sanitizing payloads");

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

        if let Some(ref roster_path) = self.roster {
            let roster = match read_json(roster_path) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("❌ {e:#}");
                    return Ok(EXIT_FATAL);
                }
            };
            if let Err(e) =
                MapBuilder::for_anonymizer(&anonymizer).build_map(&context, &roster, BuildMode::Extend)
            {
                log_error_with_context!(&e, "Roster seeding failed");
                eprintln!("❌ Roster rejected: {e}");
                return Ok(EXIT_ANONYMIZATION_REFUSED);
            }
        }

        let mut exit_code = 0;
        for path in &self.files {
            let payload = match read_json(path) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("❌ {e:#}");
                    exit_code = EXIT_FATAL;
                    continue;
                }
            };

            match anonymizer.sanitize_as(&context, self.kind, &payload) {
                Ok((sanitized, report)) => {
                    println!("{}", serde_json::to_string_pretty(&sanitized)?);
                    match self.report_format {
                        OutputFormat::Console => eprint!("{}", report.format_console()),
                        OutputFormat::Json => eprintln!("{}", report.format_json()?),
                    }
                }
                Err(e) => {
                    log_error_with_context!(&e, "Sanitization refused");
                    eprintln!("❌ {} withheld: {e}", path.display());
                    if exit_code == 0 {
                        exit_code = EXIT_ANONYMIZATION_REFUSED;
                    }
                }
            }
        }

        Ok(exit_code)
    }
}
