// canvas-shield - FERPA anonymization layer for Canvas LMS tools
// Copyright (c) 2025 canvas-shield Contributors
// Licensed under the MIT License

use canvas_shield::cli::{Cli, Commands};
use canvas_shield::config::LoggingConfig;
use canvas_shield::logging::init_logging;
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    // Optional .env; a missing file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console-only logging for CLI runs
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    let _guard = match init_logging(log_level, &LoggingConfig::console_only()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "canvas-shield");

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e:#}");
            5
        }
    };

    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Sanitize(args) => args.execute(&cli.config).await,
        Commands::BuildMap(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
