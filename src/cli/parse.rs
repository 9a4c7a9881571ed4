//! CLI parse: clap types for sentry-host. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// sentry-host - inspect how a reporting client would be configured on this host
#[derive(Parser, Debug)]
#[command(name = "sentry-host")]
#[command(about = "Resolve and exercise host-aware error-reporting client configuration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root; config/sentry.toml under it is read when present
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (in addition to workspace and global files)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Host cache root (defaults to the platform cache directory)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Host package identity
    #[arg(long)]
    pub identity: Option<String>,

    /// Simulate a host that denies network access
    #[arg(long, default_value = "false")]
    pub deny_network: bool,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Toml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the configuration a client would be built with
    Resolve {
        /// DSN (defaults to the `dsn` option, then the inert DSN)
        #[arg(long)]
        dsn: Option<String>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Build a client and send one event; without a server it lands in the buffer
    Send {
        #[arg(long)]
        dsn: Option<String>,
        /// Event message
        #[arg(long, default_value = "sentry-host test event")]
        message: String,
    },
    /// List events waiting in the offline buffer
    Buffer {
        #[arg(long)]
        dsn: Option<String>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
