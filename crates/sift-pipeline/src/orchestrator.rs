use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use sift_cluster::{cluster, pairwise_edges, representatives};
use sift_core::{embedding_text, ArticleRef, CategoryOutput, DedupConfig, EmbeddingVector, Item, Threshold};
use sift_embed::{Embed, Embedder};
use tracing::Instrument;

use crate::cancel::CancelToken;
use crate::error::{CategoryError, IllegalTransition, PipelineError};
use crate::state::CategoryState;
use crate::store::{BatchSource, OutputSink};

/// Per-invocation switches from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Recompute categories whose output already exists.
    pub force: bool,
    /// Run every stage but leave the sink untouched.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct CategorySuccess {
    pub category: String,
    pub input_count: usize,
    pub output: CategoryOutput,
}

/// A category that did not emit. The category itself ends in
/// [`CategoryState::Failed`]; `stage` is the last state it reached before
/// that.
#[derive(Debug)]
pub struct CategoryFailure {
    pub category: String,
    pub stage: CategoryState,
    pub error: CategoryError,
}

/// Outcome of one run, each list sorted by category name.
#[derive(Debug)]
pub struct RunReport {
    pub feed_date: NaiveDate,
    pub succeeded: Vec<CategorySuccess>,
    pub skipped: Vec<String>,
    pub failed: Vec<CategoryFailure>,
}

impl RunReport {
    fn new(feed_date: NaiveDate) -> Self {
        Self {
            feed_date,
            succeeded: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn sort(&mut self) {
        self.succeeded.sort_by(|a, b| a.category.cmp(&b.category));
        self.skipped.sort();
        self.failed.sort_by(|a, b| a.category.cmp(&b.category));
    }
}

enum CategoryOutcome {
    Emitted(CategorySuccess),
    Skipped,
}

pub struct Pipeline<B, S> {
    embedder: Arc<Embedder<B>>,
    store: S,
    threshold: Threshold,
    max_concurrent_categories: usize,
    embed_buffer: usize,
    options: RunOptions,
}

impl<B, S> Pipeline<B, S>
where
    B: Embed,
    S: BatchSource + OutputSink,
{
    #[must_use]
    pub fn new(embedder: Arc<Embedder<B>>, store: S, config: &DedupConfig, options: RunOptions) -> Self {
        Self {
            embedder,
            store,
            threshold: config.threshold,
            max_concurrent_categories: config.pipeline.max_concurrent_categories.max(1),
            embed_buffer: config.embedding.max_concurrent_requests.max(1),
            options,
        }
    }

    /// Deduplicate every category for `feed_date`, or just `category`.
    ///
    /// Category failures are collected in the report; the run carries on.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Listing`] if the categories for the date cannot be
    ///   listed.
    /// - [`PipelineError::DimensionMismatch`] as soon as any category sees a
    ///   vector of the wrong length. Categories still in flight are dropped.
    pub async fn run(
        &self,
        feed_date: NaiveDate,
        category: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<RunReport, PipelineError> {
        let span = tracing::info_span!("dedup_run", feed_date = %feed_date);
        self.run_categories(feed_date, category, cancel)
            .instrument(span)
            .await
    }

    async fn run_categories(
        &self,
        feed_date: NaiveDate,
        category: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<RunReport, PipelineError> {
        let categories = match category {
            Some(name) => vec![name.to_string()],
            None => self
                .store
                .categories(feed_date)
                .await
                .map_err(|source| PipelineError::Listing {
                    date: feed_date,
                    source,
                })?,
        };
        if categories.is_empty() {
            tracing::warn!("no category batches found for feed date");
        }

        let mut report = RunReport::new(feed_date);
        let mut results = stream::iter(categories)
            .map(|name| {
                let span = tracing::info_span!("category", name = %name);
                self.run_category(feed_date, name, cancel).instrument(span)
            })
            .buffer_unordered(self.max_concurrent_categories);

        while let Some(result) = results.next().await {
            match result {
                Ok((_, CategoryOutcome::Emitted(success))) => report.succeeded.push(success),
                Ok((name, CategoryOutcome::Skipped)) => report.skipped.push(name),
                Err(failure) => {
                    if let Some(source) = failure.error.dimension_mismatch() {
                        tracing::error!(
                            category = %failure.category,
                            error = %source,
                            "embedding dimension mismatch, aborting run"
                        );
                        return Err(PipelineError::DimensionMismatch {
                            category: failure.category,
                            source,
                        });
                    }
                    tracing::error!(
                        category = %failure.category,
                        stage = %failure.stage,
                        error = %failure.error,
                        "category failed"
                    );
                    report.failed.push(failure);
                }
            }
        }

        report.sort();
        tracing::info!(
            succeeded = report.succeeded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "dedup run finished"
        );
        Ok(report)
    }

    async fn run_category(
        &self,
        feed_date: NaiveDate,
        name: String,
        cancel: &CancelToken,
    ) -> Result<(String, CategoryOutcome), CategoryFailure> {
        let mut state = CategoryState::Pending;
        match self.process(feed_date, &name, cancel, &mut state).await {
            Ok(outcome) => Ok((name, outcome)),
            Err(error) => {
                let stage = state;
                // `process` only reaches `Emitted` on success.
                let error = match enter(&mut state, CategoryState::Failed) {
                    Ok(()) => error,
                    Err(transition) => CategoryError::Transition(transition),
                };
                Err(CategoryFailure {
                    category: name,
                    stage,
                    error,
                })
            }
        }
    }

    async fn process(
        &self,
        feed_date: NaiveDate,
        name: &str,
        cancel: &CancelToken,
        state: &mut CategoryState,
    ) -> Result<CategoryOutcome, CategoryError> {
        if !self.options.force && !self.options.dry_run && self.store.exists(feed_date, name).await? {
            tracing::info!("output already exists, skipping (use --force to recompute)");
            return Ok(CategoryOutcome::Skipped);
        }
        if cancel.is_cancelled() {
            return Err(CategoryError::Cancelled);
        }

        let batch = self
            .store
            .load(feed_date, name)
            .await?
            .ok_or_else(|| CategoryError::Configuration(format!("no batch for '{name}' on {feed_date}")))?;
        if batch.category != name || batch.feed_date != feed_date {
            return Err(CategoryError::Configuration(format!(
                "batch file for '{name}' on {feed_date} declares '{}' on {}",
                batch.category, batch.feed_date
            )));
        }
        let items = batch.into_items()?;
        if items.is_empty() {
            return Err(CategoryError::Configuration(format!(
                "batch for '{name}' on {feed_date} has no items"
            )));
        }
        enter(state, CategoryState::Loaded)?;
        tracing::debug!(items = items.len(), "batch loaded");

        let vectors = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CategoryError::Cancelled),
            vectors = self.embed_all(&items) => vectors?,
        };
        enter(state, CategoryState::Embedded)?;
        tracing::debug!(vectors = vectors.len(), "batch embedded");

        let edges = pairwise_edges(&items, &vectors)?;
        let clusters = cluster(&items, &edges, self.threshold);
        enter(state, CategoryState::Clustered)?;

        let articles: Vec<ArticleRef> = representatives(&items, &clusters)
            .into_iter()
            .map(ArticleRef::from)
            .collect();
        let output = CategoryOutput::new(name, feed_date, articles);
        enter(state, CategoryState::Resolved)?;
        tracing::debug!(clusters = clusters.len(), "representatives selected");

        if cancel.is_cancelled() {
            return Err(CategoryError::Cancelled);
        }
        // Existing output makes later runs skip the category, so the input
        // is archived before the output is written.
        if !self.options.dry_run {
            self.store.archive(feed_date, name).await?;
            self.store.write(&output).await?;
        }
        enter(state, CategoryState::Emitted)?;

        tracing::info!(
            input = items.len(),
            articles = output.article_count,
            removed = items.len() - output.article_count,
            dry_run = self.options.dry_run,
            "category deduplicated"
        );
        Ok(CategoryOutcome::Emitted(CategorySuccess {
            category: name.to_string(),
            input_count: items.len(),
            output,
        }))
    }

    /// Embed every item in batch order. The first failure fails the batch
    /// and drops the requests still in flight.
    async fn embed_all(&self, items: &[Item]) -> Result<Vec<EmbeddingVector>, CategoryError> {
        stream::iter(items)
            .map(|item| async move {
                let text = embedding_text(&item.title, item.link.as_deref(), item.snippet.as_deref());
                self.embedder
                    .embed(&text)
                    .await
                    .map_err(|source| CategoryError::Embedding {
                        item_id: item.id.clone(),
                        source,
                    })
            })
            .buffered(self.embed_buffer)
            .try_collect()
            .await
    }
}

/// Advance `state` to `next`, leaving it untouched on an illegal transition.
fn enter(state: &mut CategoryState, next: CategoryState) -> Result<(), IllegalTransition> {
    let from = *state;
    *state = from.advance(next)?;
    tracing::trace!(from = %from, to = %next, "category state changed");
    Ok(())
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
