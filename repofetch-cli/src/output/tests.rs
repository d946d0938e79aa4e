//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use repofetch_core::{CoreError, Repository};
use repofetch_fetch::{
    AttemptError, AttemptRecord, FetchError, FetchReport, FetchState, RemoteResponse, Stage,
    StageOutcome,
};

use crate::commands::get::GetOutcome;

fn repository() -> Repository {
    Repository::new(
        "octocat/Hello-World",
        "https://github.com/octocat/Hello-World.git",
        Utc.with_ymd_and_hms(2011, 1, 26, 19, 1, 12).unwrap(),
    )
    .with_description("My first repository on GitHub!")
    .with_stars(1_500)
}

fn outcome(result: Result<Repository, CoreError>, report: Option<FetchReport>) -> GetOutcome {
    GetOutcome {
        requested: "octocat/Hello-World".parse().unwrap(),
        result,
        report,
    }
}

/// Primary timed out twice, fallback served on its first attempt.
fn fallback_report() -> FetchReport {
    let timeout = AttemptError::Timeout(Duration::from_millis(300));
    let primary = StageOutcome {
        target: "primary".to_string(),
        response: None,
        attempts: vec![
            AttemptRecord::failure(1, &timeout, Duration::from_millis(300)),
            AttemptRecord::failure(2, &timeout, Duration::from_millis(300)),
        ],
        last_error: Some(Arc::new(timeout)),
        duration: Duration::from_millis(600),
    };
    let fallback = StageOutcome {
        target: "fallback".to_string(),
        response: None,
        attempts: vec![AttemptRecord::success(1, Duration::from_millis(40))],
        last_error: None,
        duration: Duration::from_millis(40),
    };

    FetchReport {
        result: Ok(RemoteResponse::ok_json("{}")),
        state: FetchState::Succeeded(Stage::Fallback),
        primary,
        fallback: Some(fallback),
        duration: Duration::from_millis(640),
    }
}

mod text_formatter_tests {
    use super::*;
    use crate::output::TextFormatter;
    use crate::output::text::{format_age, format_count};

    #[test]
    fn test_format_repository_plain() {
        let formatter = TextFormatter::new(false);
        let now = Utc.with_ymd_and_hms(2013, 1, 26, 19, 1, 12).unwrap();
        let output = formatter.format_repository(&repository(), now);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "octocat/Hello-World");
        assert_eq!(lines[1], "My first repository on GitHub!");
        assert_eq!(
            lines[2],
            "Clone:   https://github.com/octocat/Hello-World.git"
        );
        assert_eq!(lines[3], "Stars:   1.5K");
        assert_eq!(lines[4], "Created: 2011-01-26 (2 years ago)");
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_format_repository_colored() {
        let formatter = TextFormatter::new(true);
        let output = formatter.format_repository(&repository(), Utc::now());
        assert!(output.contains("\x1b[1m"));
    }

    #[test]
    fn test_format_not_found() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_outcome(&outcome(
            Err(CoreError::not_found("octocat", "Hello-World")),
            None,
        ));

        assert!(output.starts_with("octocat/Hello-World not found"));
        assert!(output.contains("[octocat]"));
    }

    #[test]
    fn test_format_report() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_report(&fallback_report());

        assert!(output.starts_with("Served by fallback after 3 attempts in 640ms"));
        assert!(output.contains("  primary (primary)"));
        assert!(output.contains("    #1 timeout 300ms"));
        assert!(output.contains("    #2 timeout 300ms"));
        assert!(output.contains("  fallback (fallback)"));
        assert!(output.contains("    #1 ok 40ms"));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1.0K");
        assert_eq!(format_count(2_500_000), "2.5M");
    }

    #[test]
    fn test_format_age() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let plus = |hours| at + chrono::Duration::hours(hours);

        assert_eq!(format_age(at, plus(0)), "just now");
        assert_eq!(format_age(at, plus(5)), "5h ago");
        assert_eq!(format_age(at, plus(24)), "1 day ago");
        assert_eq!(format_age(at, plus(24 * 40)), "40 days ago");
        assert_eq!(format_age(at, plus(24 * 365)), "1 year ago");
    }
}

mod json_formatter_tests {
    use super::*;
    use crate::output::JsonFormatter;

    #[test]
    fn test_format_compact_json() {
        let formatter = JsonFormatter::new(false);

        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();

        assert_eq!(output, r#"{"key":"value"}"#);
    }

    #[test]
    fn test_format_pretty_json() {
        let formatter = JsonFormatter::new(true);

        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();

        assert!(output.contains('\n'));
        assert!(output.contains("  "));
    }

    #[test]
    fn test_single_outcome_is_object() {
        let formatter = JsonFormatter::new(false);
        let output = formatter
            .format_outcomes(&[outcome(Ok(repository()), None)])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["requested"], "octocat/Hello-World");
        assert_eq!(value["repository"]["fullName"], "octocat/Hello-World");
        assert_eq!(value["repository"]["owner"], "octocat");
        assert_eq!(value["repository"]["stars"], 1_500);
        assert_eq!(value["repository"]["createdAt"], "2011-01-26T19:01:12+00:00");
        assert!(value.get("error").is_none());
        assert!(value.get("report").is_none());
    }

    #[test]
    fn test_multiple_outcomes_are_array() {
        let formatter = JsonFormatter::new(false);
        let unhealthy = FetchError::ExternalServiceUnhealthy {
            attempts: 3,
            cause: None,
        };
        let output = formatter
            .format_outcomes(&[
                outcome(Ok(repository()), None),
                outcome(Err(CoreError::from(unhealthy)), None),
            ])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["error"]["kind"], "serviceUnhealthy");
        assert!(
            items[1]["error"]["message"]
                .as_str()
                .unwrap()
                .contains("after [3] attempts")
        );
    }

    #[test]
    fn test_report_output() {
        let formatter = JsonFormatter::new(false);
        let output = formatter
            .format_outcomes(&[outcome(Ok(repository()), Some(fallback_report()))])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        let report = &value["report"];
        assert_eq!(report["servedBy"], "fallback");
        assert_eq!(report["totalAttempts"], 3);
        assert_eq!(report["durationMs"], 640);

        let stages = report["stages"].as_array().unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0]["stage"], "primary");
        assert_eq!(stages[0]["attempts"][0]["timedOut"], true);
        assert!(stages[0]["lastError"].is_string());
        assert_eq!(stages[1]["attempts"][0]["success"], true);
        assert!(stages[1].get("lastError").is_none());
    }
}
