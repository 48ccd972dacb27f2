use std::collections::BTreeMap;
use std::env::VarError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use sift_cluster::{cluster, pairwise_edges};
use sift_core::{parse_config, Batch, ItemRecord};
use sift_embed::EmbeddingError;

use super::*;
use crate::error::StoreError;

const CONFIG: &str = r"
deduplication:
  similarity-threshold: 0.85
  input-dir: unused/in
  output-dir: unused/out
  max-concurrent-categories: 2
embedding:
  provider: hashing
  model: keyword
  dimension: 2
  max-concurrent-requests: 4
  max-retries: 0
  retry-backoff-ms: 0
";

fn config() -> DedupConfig {
    parse_config(CONFIG, |_| Err(VarError::NotPresent)).expect("valid test config")
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Maps topic keywords onto fixed directions.
struct Keyword {
    dimension: usize,
    delay: Option<Duration>,
}

impl Keyword {
    fn new() -> Self {
        Self {
            dimension: 2,
            delay: None,
        }
    }
}

impl Embed for Keyword {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if text.contains("explode") {
            return Err(EmbeddingError::Status {
                provider: "keyword",
                status: 400,
                body: "bad input".to_string(),
            });
        }
        let mut v = if text.contains("gpt") {
            vec![1.0, 0.1]
        } else if text.contains("rust") {
            vec![0.1, 1.0]
        } else {
            vec![0.7, 0.7]
        };
        v.resize(self.dimension, 0.0);
        Ok(v)
    }
}

/// Gives every distinct text its own axis, so only identical texts agree.
struct Distinct {
    texts: Mutex<Vec<String>>,
}

impl Embed for Distinct {
    fn name(&self) -> &'static str {
        "distinct"
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut texts = self.texts.lock().unwrap();
        let axis = match texts.iter().position(|t| t == text) {
            Some(axis) => axis,
            None => {
                texts.push(text.to_string());
                texts.len() - 1
            }
        };
        let mut v = vec![0.0; 8];
        v[axis % 8] = 1.0;
        Ok(v)
    }
}

#[derive(Default)]
struct MemoryStore {
    batches: Mutex<BTreeMap<String, Batch>>,
    outputs: Mutex<BTreeMap<String, Vec<u8>>>,
    archived: Mutex<Vec<String>>,
    fail_archive: AtomicBool,
}

impl MemoryStore {
    fn with(batches: Vec<Batch>) -> Self {
        let store = Self::default();
        for batch in batches {
            store.batches.lock().unwrap().insert(batch.category.clone(), batch);
        }
        store
    }

    fn output(&self, category: &str) -> Option<CategoryOutput> {
        self.outputs
            .lock()
            .unwrap()
            .get(category)
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
    }
}

impl BatchSource for MemoryStore {
    async fn categories(&self, date: NaiveDate) -> Result<Vec<String>, StoreError> {
        Ok(self
            .batches
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.feed_date == date)
            .map(|b| b.category.clone())
            .collect())
    }

    async fn load(&self, _date: NaiveDate, category: &str) -> Result<Option<Batch>, StoreError> {
        Ok(self.batches.lock().unwrap().get(category).cloned())
    }

    async fn archive(&self, _date: NaiveDate, category: &str) -> Result<(), StoreError> {
        if self.fail_archive.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: format!("archive/{category}.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only archive"),
            });
        }
        self.archived.lock().unwrap().push(category.to_string());
        Ok(())
    }
}

impl OutputSink for MemoryStore {
    async fn exists(&self, _date: NaiveDate, category: &str) -> Result<bool, StoreError> {
        Ok(self.outputs.lock().unwrap().contains_key(category))
    }

    async fn write(&self, output: &CategoryOutput) -> Result<(), StoreError> {
        let bytes = output.to_json_bytes().unwrap();
        self.outputs.lock().unwrap().insert(output.category.clone(), bytes);
        Ok(())
    }
}

fn record(title: &str, link: &str, snippet: Option<&str>) -> ItemRecord {
    ItemRecord {
        title: title.to_string(),
        link: Some(link.to_string()),
        snippet: snippet.map(str::to_string),
        category: None,
        fetch_date: None,
        seen_at: None,
    }
}

fn batch(category: &str, articles: Vec<ItemRecord>) -> Batch {
    Batch {
        feed_date: date(),
        category: category.to_string(),
        articles,
    }
}

fn ai_batch() -> Batch {
    batch(
        "ai",
        vec![
            record("OpenAI releases GPT-5", "https://news.example/gpt5", Some("Short.")),
            record(
                "GPT-5 is here, says OpenAI",
                "https://blog.example/gpt-5-launch",
                Some("OpenAI has launched GPT-5 with a longer context window."),
            ),
            record("Rust 2.0 announced", "https://rust.example/2", None),
            record("Rust team ships 2.0", "https://lang.example/rust-2", Some("Editions.")),
        ],
    )
}

fn pipeline_with<B: Embed>(backend: B, store: MemoryStore, options: RunOptions) -> Pipeline<B, MemoryStore> {
    let cfg = config();
    let embedder = Arc::new(Embedder::new(backend, &cfg.embedding));
    Pipeline::new(embedder, store, &cfg, options)
}

fn pipeline(store: MemoryStore) -> Pipeline<Keyword, MemoryStore> {
    pipeline_with(Keyword::new(), store, RunOptions::default())
}

#[tokio::test]
async fn four_items_collapse_to_two_articles() {
    let pipeline = pipeline(MemoryStore::with(vec![ai_batch()]));
    let report = pipeline.run(date(), Some("ai"), &CancelToken::new()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 1);
    let success = &report.succeeded[0];
    assert_eq!(success.input_count, 4);

    let output = pipeline.store.output("ai").expect("output written");
    assert_eq!(output.article_count, 2);
    assert_eq!(output.fetch_date, date());
    assert_eq!(output.articles[0].link.as_deref(), Some("https://blog.example/gpt-5-launch"));
    assert_eq!(output.articles[1].link.as_deref(), Some("https://lang.example/rust-2"));
    assert_eq!(output, success.output);
    assert_eq!(*pipeline.store.archived.lock().unwrap(), vec!["ai".to_string()]);
}

#[tokio::test]
async fn paraphrases_and_a_repeated_link_form_one_cluster() {
    let articles = vec![
        record("OpenAI releases GPT-5", "https://news.example/gpt5", Some("Short.")),
        record(
            "GPT-5 is here, says OpenAI",
            "https://blog.example/gpt-5-launch",
            Some("OpenAI has launched GPT-5 with a longer context window."),
        ),
        record("Local bakery wins regional bread prize", "https://town.example/bakery", None),
        // Same story as the first item under another headline.
        record("Rust-free steel plant opens", "https://news.example/gpt5?utm_source=feed", None),
    ];
    let store = MemoryStore::with(vec![batch("ai", articles.clone())]);
    let pipeline = pipeline(store);
    pipeline.run(date(), Some("ai"), &CancelToken::new()).await.unwrap();

    let output = pipeline.store.output("ai").expect("output written");
    assert_eq!(output.article_count, 2);
    assert_eq!(output.articles[0].title, "GPT-5 is here, says OpenAI");
    assert_eq!(output.articles[1].title, "Local bakery wins regional bread prize");

    let items = batch("ai", articles).into_items().unwrap();
    let vectors = pipeline.embed_all(&items).await.unwrap();
    let edges = pairwise_edges(&items, &vectors).unwrap();
    let members: Vec<Vec<usize>> = cluster(&items, &edges, pipeline.threshold)
        .iter()
        .map(|c| c.members().to_vec())
        .collect();
    assert_eq!(members, vec![vec![0, 1, 3], vec![2]]);
}

#[tokio::test]
async fn stories_sharing_a_headline_prefix_stay_apart() {
    let store = MemoryStore::with(vec![batch(
        "tech",
        vec![
            record("Apple event recap - iPhone 16 Pro", "https://a.example/1", None),
            record("Apple event recap - Apple Watch Ultra", "https://b.example/2", None),
            record("Nvidia earnings - shares fall 10%", "https://c.example/3", None),
            record("Nvidia earnings - shares jump 12%", "https://d.example/4", None),
        ],
    )]);
    let backend = Distinct {
        texts: Mutex::new(Vec::new()),
    };
    let mut cfg = config();
    cfg.embedding.dimension = 8;
    let embedder = Arc::new(Embedder::new(backend, &cfg.embedding));
    let pipeline = Pipeline::new(embedder, store, &cfg, RunOptions::default());

    pipeline.run(date(), None, &CancelToken::new()).await.unwrap();
    let output = pipeline.store.output("tech").expect("output written");
    assert_eq!(output.article_count, 4);
}

#[tokio::test]
async fn failed_archive_leaves_no_output_and_a_rerun_recovers() {
    let store = MemoryStore::with(vec![ai_batch()]);
    store.fail_archive.store(true, Ordering::SeqCst);
    let pipeline = pipeline(store);

    let report = pipeline.run(date(), None, &CancelToken::new()).await.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].stage, CategoryState::Resolved);
    assert!(matches!(report.failed[0].error, CategoryError::Store(_)));
    assert!(pipeline.store.output("ai").is_none());

    pipeline.store.fail_archive.store(false, Ordering::SeqCst);
    let report = pipeline.run(date(), None, &CancelToken::new()).await.unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(report.succeeded.len(), 1);
    assert!(pipeline.store.output("ai").is_some());
    assert_eq!(*pipeline.store.archived.lock().unwrap(), vec!["ai".to_string()]);
}

#[tokio::test]
async fn exact_duplicate_links_collapse_even_when_vectors_differ() {
    let store = MemoryStore::with(vec![batch(
        "ai",
        vec![
            record("GPT story", "https://news.example/story?utm_source=x", None),
            record("Rust story", "https://NEWS.example/story", None),
        ],
    )]);
    let pipeline = pipeline(store);
    pipeline.run(date(), None, &CancelToken::new()).await.unwrap();
    assert_eq!(pipeline.store.output("ai").unwrap().article_count, 1);
}

#[tokio::test]
async fn missing_batch_is_a_configuration_failure() {
    let store = MemoryStore::with(vec![ai_batch()]);
    let pipeline = pipeline(store);

    let report = pipeline.run(date(), Some("sports"), &CancelToken::new()).await.unwrap();
    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].category, "sports");
    assert_eq!(report.failed[0].stage, CategoryState::Pending);
    assert!(matches!(report.failed[0].error, CategoryError::Configuration(_)));
}

#[tokio::test]
async fn empty_batch_fails_while_other_categories_emit() {
    let store = MemoryStore::with(vec![ai_batch(), batch("empty", vec![])]);
    let pipeline = pipeline(store);

    let report = pipeline.run(date(), None, &CancelToken::new()).await.unwrap();
    assert!(!report.is_success());
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.succeeded[0].category, "ai");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].category, "empty");
    assert!(matches!(report.failed[0].error, CategoryError::Configuration(_)));
    assert!(pipeline.store.output("ai").is_some());
    assert!(pipeline.store.output("empty").is_none());
}

#[tokio::test]
async fn mismatched_record_is_a_validation_failure() {
    let mut bad = record("GPT news", "https://x.example/1", None);
    bad.category = Some("finance".to_string());
    let store = MemoryStore::with(vec![batch("ai", vec![bad])]);
    let report = pipeline(store).run(date(), Some("ai"), &CancelToken::new()).await.unwrap();
    assert!(matches!(report.failed[0].error, CategoryError::Validation(_)));
}

#[tokio::test]
async fn one_failed_embedding_fails_the_category() {
    let store = MemoryStore::with(vec![
        batch(
            "ai",
            vec![
                record("GPT news", "https://x.example/1", None),
                record("This will explode", "https://x.example/2", None),
            ],
        ),
        batch("lang", vec![record("Rust news", "https://y.example/1", None)]),
    ]);
    let pipeline = pipeline(store);
    let report = pipeline.run(date(), None, &CancelToken::new()).await.unwrap();

    assert_eq!(report.failed.len(), 1);
    let failure = &report.failed[0];
    assert_eq!(failure.category, "ai");
    assert_eq!(failure.stage, CategoryState::Loaded);
    assert_eq!(failure.stage.advance(CategoryState::Failed), Ok(CategoryState::Failed));
    assert!(matches!(failure.error, CategoryError::Embedding { .. }));
    assert!(pipeline.store.output("ai").is_none(), "no partial output");
    assert!(pipeline.store.output("lang").is_some());
}

#[tokio::test]
async fn dimension_mismatch_aborts_the_run() {
    let backend = Keyword {
        dimension: 3,
        delay: None,
    };
    let pipeline = pipeline_with(backend, MemoryStore::with(vec![ai_batch()]), RunOptions::default());
    let err = pipeline.run(date(), None, &CancelToken::new()).await.unwrap_err();
    match err {
        PipelineError::DimensionMismatch { category, source } => {
            assert_eq!(category, "ai");
            assert_eq!((source.expected, source.actual), (2, 3));
        }
        other @ PipelineError::Listing { .. } => panic!("expected DimensionMismatch, got: {other:?}"),
    }
}

#[tokio::test]
async fn existing_output_is_skipped_unless_forced() {
    let pipeline = pipeline(MemoryStore::with(vec![ai_batch()]));
    pipeline.run(date(), None, &CancelToken::new()).await.unwrap();
    let first = pipeline.store.outputs.lock().unwrap().get("ai").cloned().unwrap();

    let report = pipeline.run(date(), None, &CancelToken::new()).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.skipped, vec!["ai".to_string()]);
    assert!(report.succeeded.is_empty());

    let forced = Pipeline {
        options: RunOptions {
            force: true,
            dry_run: false,
        },
        ..pipeline
    };
    let report = forced.run(date(), None, &CancelToken::new()).await.unwrap();
    assert_eq!(report.succeeded.len(), 1);
    let second = forced.store.outputs.lock().unwrap().get("ai").cloned().unwrap();
    assert_eq!(first, second, "re-run is byte-identical");
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let options = RunOptions {
        force: false,
        dry_run: true,
    };
    let pipeline = pipeline_with(Keyword::new(), MemoryStore::with(vec![ai_batch()]), options);
    let report = pipeline.run(date(), None, &CancelToken::new()).await.unwrap();

    assert_eq!(report.succeeded[0].output.article_count, 2);
    assert!(pipeline.store.outputs.lock().unwrap().is_empty());
    assert!(pipeline.store.archived.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_before_start_fails_every_category() {
    let pipeline = pipeline(MemoryStore::with(vec![ai_batch(), batch("lang", vec![])]));
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = pipeline.run(date(), None, &cancel).await.unwrap();
    assert_eq!(report.failed.len(), 2);
    assert!(report
        .failed
        .iter()
        .all(|f| matches!(f.error, CategoryError::Cancelled) && f.stage == CategoryState::Pending));
}

#[tokio::test]
async fn cancel_during_embedding_abandons_the_category() {
    let backend = Keyword {
        dimension: 2,
        delay: Some(Duration::from_secs(30)),
    };
    let pipeline = pipeline_with(backend, MemoryStore::with(vec![ai_batch()]), RunOptions::default());
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let report = tokio::time::timeout(Duration::from_secs(5), pipeline.run(date(), None, &cancel))
        .await
        .expect("cancellation should end the run promptly")
        .unwrap();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].stage, CategoryState::Loaded);
    assert!(matches!(report.failed[0].error, CategoryError::Cancelled));
    assert!(pipeline.store.output("ai").is_none());
}

#[tokio::test]
async fn report_lists_categories_in_name_order() {
    let store = MemoryStore::with(vec![
        batch("zeta", vec![record("GPT one", "https://z.example/1", None)]),
        batch("alpha", vec![record("Rust one", "https://a.example/1", None)]),
        batch("mid", vec![record("Other", "https://m.example/1", None)]),
    ]);
    let report = pipeline(store).run(date(), None, &CancelToken::new()).await.unwrap();
    let names: Vec<&str> = report.succeeded.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}
