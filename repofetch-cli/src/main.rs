// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Repofetch CLI - resilient repository lookups from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Fetch one repository
//! repofetch get octocat/Hello-World
//!
//! # Fetch several at once, as JSON
//! repofetch get rust-lang/rust tokio-rs/tokio --format json --pretty
//!
//! # Show every attempt made against the primary and fallback hosts
//! repofetch get octocat/Hello-World --report
//!
//! # Use a mirror and a tighter budget
//! repofetch --fallback 'https://mirror.local/repos/{owner}/{id}' --timeout-ms 500 get a/b
//!
//! # Write the default configuration file
//! repofetch config init
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, get};

// ============================================================================
// CLI Definition
// ============================================================================

/// Repofetch CLI - resilient repository lookups.
#[derive(Parser)]
#[command(name = "repofetch")]
#[command(about = "Fetch repository descriptors with retries and a fallback host")]
#[command(long_about = r#"
Repofetch reads repository descriptors from a primary host. Every attempt
is bounded by a timeout and retried a fixed number of times. When the
primary host is exhausted, the same budget is spent on the fallback host
before the service is reported unhealthy.

Exit codes:
  0  every repository was fetched
  1  an error occurred
  2  a repository was not found
  3  both hosts are unhealthy

Examples:
  repofetch get octocat/Hello-World
  repofetch get a/b c/d --format json
  repofetch get octocat/Hello-World --report
  repofetch config show
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (defaults to the user config directory).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Primary URL template, e.g. `https://api.github.com/repos/{owner}/{id}`.
    #[arg(long, global = true)]
    pub primary: Option<String>,

    /// Fallback URL template.
    #[arg(long, global = true)]
    pub fallback: Option<String>,

    /// Per-attempt timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Attempts per host.
    #[arg(long, short, global = true)]
    pub attempts: Option<u32>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one or more repositories.
    #[command(visible_alias = "g")]
    Get(get::GetArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Repository not found.
    NotFound = 2,
    /// Primary and fallback hosts are both unhealthy.
    ServiceUnhealthy = 3,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("repofetch=debug,repofetch_fetch=debug,repofetch_core=debug,info")
    } else {
        EnvFilter::new("repofetch=warn,repofetch_fetch=warn,repofetch_core=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Get(args) => get::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli).map(|()| ExitCode::Success),
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }
}
