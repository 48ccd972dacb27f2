mod logging;
mod summary;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use chrono::{Local, NaiveDate};
use clap::Parser;
use sift_core::DedupConfig;
use sift_embed::{Backend, Embedder};
use sift_pipeline::{CancelToken, FsStore, Pipeline, RunOptions, RunReport};

#[derive(Debug, Parser)]
#[command(name = "sift")]
#[command(about = "Collapse near-duplicate articles in daily category batches")]
struct Cli {
    /// Feed date to process (YYYY-MM-DD); defaults to today.
    #[arg(long = "feed-date", alias = "feed_date")]
    feed_date: Option<String>,

    /// Only process this category.
    #[arg(long)]
    category: Option<String>,

    #[arg(long, env = "SIFT_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Recompute categories that already have output.
    #[arg(long)]
    force: bool,

    /// Print results as JSON instead of writing them.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn feed_date(&self) -> anyhow::Result<NaiveDate> {
        match &self.feed_date {
            Some(raw) => Ok(sift_core::parse_feed_date(raw)?),
            None => Ok(Local::now().date_naive()),
        }
    }

    fn options(&self) -> RunOptions {
        RunOptions {
            force: self.force,
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match sift_core::load_config_from_env(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sift: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = logging::init(config.pipeline.log_dir.as_deref());

    match run(&cli, &config).await {
        Ok(report) => {
            report_results(&report, cli.dry_run, &mut std::io::stdout().lock(), &mut std::io::stderr().lock());
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "dedup run aborted");
            eprintln!("sift: run aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: &DedupConfig) -> anyhow::Result<RunReport> {
    let feed_date = cli.feed_date()?;
    let backend = Backend::from_settings(&config.embedding).context("failed to build embedding backend")?;
    tracing::info!(
        provider = %config.embedding.provider,
        model = %config.embedding.model,
        dimension = config.embedding.dimension,
        threshold = config.threshold.value(),
        "starting dedup run"
    );
    let embedder = Arc::new(Embedder::new(backend, &config.embedding));
    let pipeline = Pipeline::new(embedder, FsStore::new(&config.pipeline), config, cli.options());

    let cancel = CancelToken::new();
    watch_ctrl_c(cancel.clone());
    if let Some(secs) = config.pipeline.run_timeout_secs {
        watch_deadline(cancel.clone(), Duration::from_secs(secs));
    }

    let report = pipeline.run(feed_date, cli.category.as_deref(), &cancel).await?;
    Ok(report)
}

fn watch_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("received ctrl-c, cancelling run");
            cancel.cancel();
        }
    });
}

fn watch_deadline(cancel: CancelToken, timeout: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!(timeout_secs = timeout.as_secs(), "run timeout reached, cancelling");
        cancel.cancel();
    });
}

/// Dry-run JSON goes to `out`, one document per category, so it can be
/// piped; the human summary always goes to `err`.
fn report_results(report: &RunReport, dry_run: bool, out: &mut impl Write, err: &mut impl Write) {
    if dry_run {
        for success in &report.succeeded {
            match success.output.to_json_bytes() {
                Ok(bytes) => {
                    let _ = out.write_all(&bytes);
                }
                Err(e) => {
                    tracing::error!(category = %success.category, error = %e, "failed to serialize output");
                }
            }
        }
        let _ = out.flush();
    }
    let _ = err.write_all(summary::render(report).as_bytes());
}

#[cfg(test)]
mod tests;
