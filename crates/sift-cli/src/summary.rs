use std::fmt::Write as _;

use sift_pipeline::RunReport;

/// Human-readable run summary, one line per category.
pub(crate) fn render(report: &RunReport) -> String {
    let mut out = format!(
        "sift {}: {} succeeded, {} skipped, {} failed\n",
        report.feed_date,
        report.succeeded.len(),
        report.skipped.len(),
        report.failed.len(),
    );
    for success in &report.succeeded {
        let _ = writeln!(
            out,
            "  ok       {}  {} -> {} articles",
            success.category, success.input_count, success.output.article_count
        );
    }
    for name in &report.skipped {
        let _ = writeln!(out, "  skipped  {name}  output exists");
    }
    for failure in &report.failed {
        let _ = writeln!(
            out,
            "  failed   {}  [{}] {}",
            failure.category, failure.stage, failure.error
        );
    }
    out
}
