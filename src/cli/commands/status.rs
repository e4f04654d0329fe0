//! Status command implementation
//!
//! Displays anonymization configuration and mapping statistics. Mapping state
//! lives in process memory, so payload files can be given to sanitize them first
//! and see the resulting counts.

use super::{context_from_args, load_anonymizer, read_json, OutputFormat, EXIT_CONFIG_ERROR};
use crate::anonymization::{PayloadKind, StatusReporter};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Canvas course identifier; overview of all contexts when omitted
    #[arg(long)]
    pub course: Option<String>,

    /// Optional session identifier
    #[arg(long, requires = "course")]
    pub session: Option<String>,

    /// Payload kind of the given files
    #[arg(long, default_value = "generic")]
    pub kind: PayloadKind,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Payload files to sanitize before reporting (requires --course)
    #[arg(requires = "course")]
    pub files: Vec<PathBuf>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking anonymization status");

        let (_, anonymizer) = match load_anonymizer(config_path) {
            Ok(loaded) => loaded,
            Err(code) => return Ok(code),
        };

        let context = match self.course.as_deref() {
            Some(course) => match context_from_args(course, self.session.as_deref()) {
                Ok(c) => Some(c),
                Err(e) => {
                    eprintln!("❌ {e}");
                    return Ok(EXIT_CONFIG_ERROR);
                }
            },
            None => None,
        };

        if let Some(ref context) = context {
            for path in &self.files {
                let payload = read_json(path)?;
                if let Err(e) = anonymizer.sanitize_as(context, self.kind, &payload) {
                    eprintln!("⚠️  {} was not sanitized: {e}", path.display());
                }
            }
        }

        let reporter = StatusReporter::for_anonymizer(&anonymizer);
        let status = match context {
            Some(ref context) => reporter.status(context),
            None => reporter.overview(),
        };

        match self.format {
            OutputFormat::Console => print!("{}", status.format_console()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        }

        Ok(0)
    }
}
