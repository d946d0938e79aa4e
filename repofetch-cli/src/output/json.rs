//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use repofetch_core::{CoreError, Repository};
use repofetch_fetch::{AttemptRecord, FetchReport, Stage, StageOutcome};
use serde::{Serialize, Serializer};

use crate::commands::get::GetOutcome;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one requested repository.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOutput {
    pub requested: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportOutput>,
}

/// A repository descriptor.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryOutput {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub clone_url: String,
    pub stars: u64,
    #[serde(serialize_with = "serialize_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Error info.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub kind: &'static str,
    pub message: String,
}

/// Attempt log.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_by: Option<String>,
    pub total_attempts: u32,
    pub duration_ms: u128,
    pub stages: Vec<StageOutput>,
}

/// One stage of the attempt log.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOutput {
    pub stage: String,
    pub target: String,
    pub attempts: Vec<AttemptOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// A single attempt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutput {
    pub number: u32,
    pub success: bool,
    pub timed_out: bool,
    pub duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&Repository> for RepositoryOutput {
    fn from(repository: &Repository) -> Self {
        Self {
            full_name: repository.full_name.clone(),
            owner: repository.owner().map(str::to_string),
            name: repository.name().to_string(),
            description: repository.description.clone(),
            clone_url: repository.clone_url.clone(),
            stars: repository.stars,
            created_at: repository.created_at,
        }
    }
}

impl From<&CoreError> for ErrorOutput {
    fn from(error: &CoreError) -> Self {
        let kind = match error {
            CoreError::RepositoryNotFound { .. } => "notFound",
            CoreError::ServiceUnhealthy { .. } => "serviceUnhealthy",
            CoreError::UnexpectedStatus(_) => "unexpectedStatus",
            CoreError::InvalidData(_) | CoreError::Serialization(_) => "invalidData",
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

impl From<&AttemptRecord> for AttemptOutput {
    fn from(record: &AttemptRecord) -> Self {
        Self {
            number: record.number,
            success: record.success,
            timed_out: record.timed_out,
            duration_ms: record.duration.as_millis(),
            error: record.error.clone(),
        }
    }
}

fn stage_output(stage: Stage, outcome: &StageOutcome) -> StageOutput {
    StageOutput {
        stage: stage.to_string(),
        target: outcome.target.clone(),
        attempts: outcome.attempts.iter().map(AttemptOutput::from).collect(),
        last_error: outcome.last_error().map(ToString::to_string),
    }
}

impl From<&FetchReport> for ReportOutput {
    fn from(report: &FetchReport) -> Self {
        let mut stages = vec![stage_output(Stage::Primary, &report.primary)];
        if let Some(fallback) = &report.fallback {
            stages.push(stage_output(Stage::Fallback, fallback));
        }

        Self {
            served_by: report.served_by().map(|stage| stage.to_string()),
            total_attempts: report.total_attempts(),
            duration_ms: report.duration.as_millis(),
            stages,
        }
    }
}

impl From<&GetOutcome> for GetOutput {
    fn from(outcome: &GetOutcome) -> Self {
        Self {
            requested: outcome.requested.to_string(),
            repository: outcome.result.as_ref().ok().map(RepositoryOutput::from),
            error: outcome.result.as_ref().err().map(ErrorOutput::from),
            report: outcome.report.as_ref().map(ReportOutput::from),
        }
    }
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats fetch outcomes; a single outcome is emitted as an object.
    pub fn format_outcomes(&self, outcomes: &[GetOutcome]) -> Result<String> {
        let outputs: Vec<GetOutput> = outcomes.iter().map(GetOutput::from).collect();

        if let [single] = outputs.as_slice() {
            self.format(single)
        } else {
            self.format(&outputs)
        }
    }
}
