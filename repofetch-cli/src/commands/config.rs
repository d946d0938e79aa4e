//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use repofetch_fetch::FetchConfig;
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration, including command-line overrides.
    Show,

    /// Show the configuration file path.
    Path,

    /// Write the default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => show_path(cli),
        ConfigAction::Init { force } => init_config(*force, cli),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = super::load_config(cli)?;
    // Rejects an invalid retry policy before printing anything.
    let orchestrator = config.orchestrator_config()?;

    match cli.format {
        OutputFormat::Text => {
            println!("Repofetch Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Primary:       {}", config.primary_url);
            println!("Fallback:      {}", config.fallback_url);
            println!(
                "Primary stage: {} attempts x {}ms",
                orchestrator.primary_policy.max_attempts(),
                orchestrator.primary_policy.timeout_per_attempt().as_millis()
            );
            let fallback = orchestrator.effective_fallback_policy();
            println!(
                "Fallback stage: {} attempts x {}ms",
                fallback.max_attempts(),
                fallback.timeout_per_attempt().as_millis()
            );
            println!("Max in flight: {}", config.max_in_flight);
            match &config.allowed_domains {
                Some(domains) => println!("Domains:       {}", domains.join(", ")),
                None => println!("Domains:       any"),
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&config)?);
        }
    }

    Ok(())
}

fn show_path(cli: &Cli) -> Result<()> {
    let path = super::config_path(cli);

    match cli.format {
        OutputFormat::Text => {
            println!("Config file: {}", path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_file": path.display().to_string(),
                "exists": path.exists(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

fn init_config(force: bool, cli: &Cli) -> Result<()> {
    let path = super::config_path(cli);

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, use --force to overwrite",
            path.display()
        );
    }

    FetchConfig::default().save_to(&path)?;

    info!(path = %path.display(), "Configuration initialized");
    if !cli.quiet {
        println!("Wrote {}", path.display());
    }

    Ok(())
}
