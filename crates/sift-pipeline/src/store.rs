//! Where batches come from and where outputs go.
//!
//! [`FsStore`] lays both out by date:
//!
//! ```text
//! {input-dir}/{YYYY-MM-DD}/{category}.json     Batch
//! {output-dir}/{YYYY-MM-DD}/{category}.json    CategoryOutput
//! {archive-dir}/{YYYY-MM-DD}/{category}.json   copy of the input batch
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use sift_core::{Batch, CategoryOutput, PipelineSettings};

use crate::error::StoreError;

pub trait BatchSource: Send + Sync {
    /// Category names with a batch on `date`, sorted.
    fn categories(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// The batch for `(date, category)`, or `None` if there is none.
    fn load(
        &self,
        date: NaiveDate,
        category: &str,
    ) -> impl Future<Output = Result<Option<Batch>, StoreError>> + Send;

    /// Keep a copy of a processed input batch. A no-op unless the source is
    /// configured to archive.
    fn archive(
        &self,
        date: NaiveDate,
        category: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

pub trait OutputSink: Send + Sync {
    fn exists(
        &self,
        date: NaiveDate,
        category: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn write(&self, output: &CategoryOutput) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Debug, Clone)]
pub struct FsStore {
    input_dir: PathBuf,
    output_dir: PathBuf,
    archive_dir: Option<PathBuf>,
}

impl FsStore {
    #[must_use]
    pub fn new(settings: &PipelineSettings) -> Self {
        Self {
            input_dir: settings.input_dir.clone(),
            output_dir: settings.output_dir.clone(),
            archive_dir: settings.archive_dir.clone(),
        }
    }

    #[must_use]
    pub fn input_path(&self, date: NaiveDate, category: &str) -> PathBuf {
        dated_file(&self.input_dir, date, category)
    }

    #[must_use]
    pub fn output_path(&self, date: NaiveDate, category: &str) -> PathBuf {
        dated_file(&self.output_dir, date, category)
    }
}

fn dated_file(root: &Path, date: NaiveDate, category: &str) -> PathBuf {
    root.join(date.format("%Y-%m-%d").to_string())
        .join(format!("{category}.json"))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

async fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_error(parent))?;
    }
    Ok(())
}

impl BatchSource for FsStore {
    async fn categories(&self, date: NaiveDate) -> Result<Vec<String>, StoreError> {
        let dir = self.input_dir.join(date.format("%Y-%m-%d").to_string());
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(io_error(&dir))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&dir))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn load(&self, date: NaiveDate, category: &str) -> Result<Option<Batch>, StoreError> {
        let path = self.input_path(date, category);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path)(e)),
        };
        let batch = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(batch))
    }

    async fn archive(&self, date: NaiveDate, category: &str) -> Result<(), StoreError> {
        let Some(archive_dir) = &self.archive_dir else {
            return Ok(());
        };
        let from = self.input_path(date, category);
        let to = dated_file(archive_dir, date, category);
        ensure_parent(&to).await?;
        tokio::fs::copy(&from, &to).await.map_err(io_error(&to))?;
        tracing::debug!(from = %from.display(), to = %to.display(), "archived input batch");
        Ok(())
    }
}

impl OutputSink for FsStore {
    async fn exists(&self, date: NaiveDate, category: &str) -> Result<bool, StoreError> {
        let path = self.output_path(date, category);
        tokio::fs::try_exists(&path).await.map_err(io_error(&path))
    }

    /// Writes through a temporary file and a rename, so a reader never sees
    /// a half-written output.
    async fn write(&self, output: &CategoryOutput) -> Result<(), StoreError> {
        let path = self.output_path(output.fetch_date, &output.category);
        ensure_parent(&path).await?;

        let bytes = output.to_json_bytes().map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await.map_err(io_error(&tmp))?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_error(&path))?;
        Ok(())
    }
}
