//! Text output formatting with colors.

use chrono::{DateTime, Utc};
use repofetch_core::{CoreError, Repository};
use repofetch_fetch::{FetchReport, StageOutcome};

use crate::commands::get::GetOutcome;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats one fetch outcome, followed by its attempt log if present.
    pub fn format_outcome(&self, outcome: &GetOutcome) -> String {
        let mut block = match &outcome.result {
            Ok(repository) => self.format_repository(repository, Utc::now()),
            Err(error) => self.format_error(&outcome.requested.to_string(), error),
        };

        if let Some(report) = &outcome.report {
            block.push('\n');
            block.push_str(&self.format_report(report));
        }

        block
    }

    /// Formats a repository.
    pub fn format_repository(&self, repository: &Repository, now: DateTime<Utc>) -> String {
        let mut lines = vec![self.bold(&repository.full_name)];

        if let Some(description) = &repository.description {
            lines.push(self.dim(description));
        }

        lines.push(format!("Clone:   {}", self.cyan(&repository.clone_url)));
        lines.push(format!("Stars:   {}", format_count(repository.stars)));
        lines.push(format!(
            "Created: {} ({})",
            repository.created_at.format("%Y-%m-%d"),
            format_age(repository.created_at, now)
        ));

        lines.join("\n")
    }

    /// Formats an error for a requested repository.
    pub fn format_error(&self, requested: &str, error: &CoreError) -> String {
        let label = match error {
            CoreError::RepositoryNotFound { .. } => self.yellow("not found"),
            CoreError::ServiceUnhealthy { .. } => self.red("unhealthy"),
            _ => self.red("error"),
        };

        format!("{} {}\n  {}", self.bold(requested), label, error)
    }

    /// Formats the per-stage attempt log.
    pub fn format_report(&self, report: &FetchReport) -> String {
        let mut lines = Vec::new();

        let served = report
            .served_by()
            .map_or_else(|| "nobody".to_string(), |stage| stage.to_string());
        lines.push(self.dim(&format!(
            "Served by {served} after {} attempt{} in {}ms",
            report.total_attempts(),
            if report.total_attempts() == 1 { "" } else { "s" },
            report.duration.as_millis()
        )));

        lines.extend(self.format_stage("primary", &report.primary));
        if let Some(fallback) = &report.fallback {
            lines.extend(self.format_stage("fallback", fallback));
        }

        lines.join("\n")
    }

    fn format_stage(&self, label: &str, stage: &StageOutcome) -> Vec<String> {
        let mut lines = vec![format!("  {label} ({})", stage.target)];

        for attempt in &stage.attempts {
            let status = if attempt.success {
                self.green("ok")
            } else if attempt.timed_out {
                self.yellow("timeout")
            } else {
                self.red("failed")
            };

            let mut line = format!(
                "    #{} {status} {}ms",
                attempt.number,
                attempt.duration.as_millis()
            );
            if let Some(error) = &attempt.error {
                line.push_str(&format!(" {}", self.dim(error)));
            }
            lines.push(line);
        }

        lines
    }

    // ========================================================================
    // Colors
    // ========================================================================

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

/// Formats a count with K/M suffixes.
pub fn format_count(n: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let value = n as f64;
    if n >= 1_000_000 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Formats how long ago `at` was, relative to `now`.
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - at;

    if diff.num_days() >= 365 {
        let years = diff.num_days() / 365;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    } else if diff.num_days() >= 1 {
        let days = diff.num_days();
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if diff.num_hours() >= 1 {
        format!("{}h ago", diff.num_hours())
    } else {
        "just now".to_string()
    }
}
