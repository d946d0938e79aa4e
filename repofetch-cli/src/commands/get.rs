//! Get command - fetch and display repositories.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::Args;
use futures::future::join_all;
use repofetch_core::{CoreError, Repository, RepositoryService};
use repofetch_fetch::{FallbackOrchestrator, FetchBackend, FetchError, FetchReport, backend};
use tracing::{debug, info};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the get command.
#[derive(Args)]
pub struct GetArgs {
    /// Repositories to fetch, as `owner/name`.
    #[arg(required = true, value_name = "OWNER/NAME")]
    pub repositories: Vec<RepoRef>,

    /// Show the attempt log for each repository.
    #[arg(long)]
    pub report: bool,
}

/// An `owner/name` pair given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl FromStr for RepoRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(format!("expected OWNER/NAME, got '{s}'")),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Result of fetching one requested repository.
#[derive(Debug)]
pub struct GetOutcome {
    /// What was asked for.
    pub requested: RepoRef,
    /// The repository, or why it could not be read.
    pub result: Result<Repository, CoreError>,
    /// Attempt log, when requested.
    pub report: Option<FetchReport>,
}

impl GetOutcome {
    /// Maps this outcome to an exit code.
    pub fn exit_code(&self) -> ExitCode {
        match &self.result {
            Ok(_) => ExitCode::Success,
            Err(CoreError::RepositoryNotFound { .. }) => ExitCode::NotFound,
            Err(CoreError::ServiceUnhealthy { .. }) => ExitCode::ServiceUnhealthy,
            Err(_) => ExitCode::Error,
        }
    }
}

/// Runs the get command.
pub async fn run(args: &GetArgs, cli: &Cli) -> Result<ExitCode> {
    let config = super::load_config(cli)?;
    let orchestrator = config.build_orchestrator()?;

    info!(count = args.repositories.len(), "Fetching repositories");

    let outcomes = if args.report {
        fetch_with_reports(&orchestrator, &args.repositories).await
    } else {
        fetch_all(orchestrator, &args.repositories).await
    };

    output_outcomes(&outcomes, cli)?;

    // The most severe failure decides the exit code.
    Ok(outcomes
        .iter()
        .map(GetOutcome::exit_code)
        .max()
        .unwrap_or(ExitCode::Success))
}

/// Fetches all repositories concurrently through the repository service.
async fn fetch_all(orchestrator: FallbackOrchestrator, repositories: &[RepoRef]) -> Vec<GetOutcome> {
    let service = RepositoryService::new(FetchBackend::new(orchestrator));

    let futures = repositories.iter().map(|repo| {
        let service = &service;
        async move {
            let result = service.read_by_owner_and_name(&repo.owner, &repo.name).await;
            debug!(repository = %repo, ok = result.is_ok(), "Fetch finished");
            GetOutcome {
                requested: repo.clone(),
                result,
                report: None,
            }
        }
    });

    join_all(futures).await
}

/// Fetches all repositories concurrently, keeping the attempt logs.
async fn fetch_with_reports(
    orchestrator: &FallbackOrchestrator,
    repositories: &[RepoRef],
) -> Vec<GetOutcome> {
    let futures = repositories.iter().map(|repo| async move {
        let report = orchestrator.fetch_with_report(&repo.owner, &repo.name).await;

        let result = match &report.result {
            Ok(response) => backend::to_repository(&repo.owner, &repo.name, response),
            Err(e) => Err(unhealthy_from_report(&report, e)),
        };

        GetOutcome {
            requested: repo.clone(),
            result,
            report: Some(report),
        }
    });

    join_all(futures).await
}

/// Builds the service-unhealthy error for a failed report from its last stage.
fn unhealthy_from_report(report: &FetchReport, error: &FetchError) -> CoreError {
    let last_stage = report.fallback.as_ref().unwrap_or(&report.primary);
    CoreError::ServiceUnhealthy {
        message: error.to_string(),
        attempts: last_stage.attempts_count(),
        cause: last_stage
            .last_error()
            .cloned()
            .map(|cause| Box::new(cause) as Box<dyn std::error::Error + Send + Sync>),
    }
}

/// Outputs the outcomes in the selected format.
fn output_outcomes(outcomes: &[GetOutcome], cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            let blocks: Vec<String> = outcomes
                .iter()
                .map(|outcome| formatter.format_outcome(outcome))
                .collect();
            println!("{}", blocks.join("\n\n"));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_outcomes(outcomes)?);
        }
    }

    Ok(())
}
