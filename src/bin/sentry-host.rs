//! sentry-host CLI Binary
//!
//! Resolves and exercises the host-aware client configuration from the command line.

use anyhow::Context as _;
use clap::Parser;
use sentry_host::cli::{map_error, Cli, RunContext};
use sentry_host::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let context = match RunContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    if let Err(e) = setup_logging(&cli, &context) {
        eprintln!("Failed to initialize logging: {:#}", e);
        process::exit(1);
    }

    info!("sentry-host CLI starting");

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

fn setup_logging(cli: &Cli, context: &RunContext) -> anyhow::Result<()> {
    let config = build_logging_config(
        cli,
        context
            .logging_config()
            .context("reading [logging] configuration")?,
    );
    init_logging(Some(&config)).context("installing subscriber")?;
    Ok(())
}

/// Build logging configuration from CLI args on top of the configured values.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, mut config: LoggingConfig) -> LoggingConfig {
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }
    config
}
