use sift_core::{ArticleRef, BatchError, CategoryOutput};
use sift_pipeline::{CategoryError, CategoryFailure, CategoryState, CategorySuccess};

use super::*;

#[test]
fn no_args_uses_defaults() {
    let cli = Cli::try_parse_from(["sift"]).expect("expected valid cli args");
    assert!(cli.feed_date.is_none());
    assert!(cli.category.is_none());
    assert!(!cli.force);
    assert!(!cli.dry_run);
}

#[test]
fn parses_feed_date_and_category() {
    let cli = Cli::try_parse_from(["sift", "--feed-date", "2024-01-01", "--category", "ai"]).unwrap();
    assert_eq!(cli.feed_date.as_deref(), Some("2024-01-01"));
    assert_eq!(cli.category.as_deref(), Some("ai"));
    assert_eq!(cli.feed_date().unwrap(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
}

#[test]
fn accepts_underscore_feed_date_alias() {
    let cli = Cli::try_parse_from(["sift", "--feed_date", "2024-02-29"]).unwrap();
    assert_eq!(cli.feed_date().unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
}

#[test]
fn invalid_feed_date_is_an_error() {
    let cli = Cli::try_parse_from(["sift", "--feed-date", "2024-13-01"]).unwrap();
    assert!(cli.feed_date().is_err());
}

#[test]
fn missing_feed_date_defaults_to_today() {
    let cli = Cli::try_parse_from(["sift"]).unwrap();
    assert_eq!(cli.feed_date().unwrap(), Local::now().date_naive());
}

#[test]
fn parses_force_and_dry_run() {
    let cli = Cli::try_parse_from(["sift", "--force", "--dry-run"]).unwrap();
    let options = cli.options();
    assert!(options.force);
    assert!(options.dry_run);
}

#[test]
fn explicit_config_path_is_used() {
    let cli = Cli::try_parse_from(["sift", "--config", "/etc/sift/config.yaml"]).unwrap();
    assert_eq!(cli.config, PathBuf::from("/etc/sift/config.yaml"));
}

#[test]
fn unknown_flag_is_rejected() {
    assert!(Cli::try_parse_from(["sift", "--threshold", "0.5"]).is_err());
}

fn sample_report() -> RunReport {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    RunReport {
        feed_date: date,
        succeeded: vec![CategorySuccess {
            category: "ai".to_string(),
            input_count: 4,
            output: CategoryOutput::new(
                "ai",
                date,
                vec![
                    ArticleRef {
                        title: "a".to_string(),
                        link: Some("https://a.example".to_string()),
                    },
                    ArticleRef {
                        title: "b".to_string(),
                        link: None,
                    },
                ],
            ),
        }],
        skipped: vec!["tech".to_string()],
        failed: vec![CategoryFailure {
            category: "science".to_string(),
            stage: CategoryState::Pending,
            error: CategoryError::Validation(BatchError::EmptyTitle { position: 2 }),
        }],
    }
}

#[test]
fn summary_lists_every_category() {
    let text = summary::render(&sample_report());
    assert!(text.starts_with("sift 2024-01-01: 1 succeeded, 1 skipped, 1 failed\n"));
    assert!(text.contains("ok       ai  4 -> 2 articles"));
    assert!(text.contains("skipped  tech"));
    assert!(text.contains("failed   science  [pending] validation error:"));
}

#[test]
fn dry_run_stdout_is_only_json() {
    let (mut out, mut err) = (Vec::new(), Vec::new());
    report_results(&sample_report(), true, &mut out, &mut err);

    let parsed: CategoryOutput = serde_json::from_slice(&out).expect("stdout is one JSON document");
    assert_eq!(parsed.article_count, 2);
    assert!(String::from_utf8(err).unwrap().starts_with("sift 2024-01-01:"));
}

#[test]
fn normal_run_writes_nothing_to_stdout() {
    let (mut out, mut err) = (Vec::new(), Vec::new());
    report_results(&sample_report(), false, &mut out, &mut err);
    assert!(out.is_empty());
    assert!(!err.is_empty());
}
