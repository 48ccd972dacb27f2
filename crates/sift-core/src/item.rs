//! Batch records as handed over by the external collector, and the
//! immutable `Item` arena the pipeline works on.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{BatchError, ConfigError};

/// Query parameters that never change which article a link points at.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid"];

/// One record of a collected batch file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub fetch_date: Option<NaiveDate>,
    /// When the collector first saw the item.
    #[serde(default)]
    pub seen_at: Option<DateTime<Utc>>,
}

/// All records collected for one `(feed_date, category)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub feed_date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub articles: Vec<ItemRecord>,
}

/// An ingested, immutable batch item.
///
/// `key` is the digest of the identity key (canonical link, or title +
/// category + date when there is no link) and is shared by exact duplicates.
/// `id` is `"{key}-{occurrence}"` and is unique within the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub key: String,
    pub title: String,
    pub link: Option<String>,
    pub canonical_link: Option<String>,
    pub category: String,
    pub fetch_date: NaiveDate,
    pub snippet: Option<String>,
    pub seen_at: Option<DateTime<Utc>>,
    /// Ingest order within the batch.
    pub position: usize,
}

impl Item {
    /// Length of the trimmed snippet in characters; 0 when absent.
    #[must_use]
    pub fn snippet_len(&self) -> usize {
        self.snippet
            .as_deref()
            .map_or(0, |s| s.trim().chars().count())
    }
}

impl Batch {
    /// Validate the records and turn them into the item arena.
    ///
    /// Records may omit `category` and `fetch_date`; when present they must
    /// match the batch.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] for the first record that is empty or belongs
    /// to a different category or date.
    pub fn into_items(self) -> Result<Vec<Item>, BatchError> {
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut items = Vec::with_capacity(self.articles.len());

        for (position, record) in self.articles.into_iter().enumerate() {
            let title = record.title.trim().to_string();
            if title.is_empty() {
                return Err(BatchError::EmptyTitle { position });
            }

            if let Some(found) = record.category.as_deref() {
                if found != self.category {
                    return Err(BatchError::CategoryMismatch {
                        position,
                        expected: self.category.clone(),
                        found: found.to_string(),
                    });
                }
            }

            if let Some(found) = record.fetch_date {
                if found != self.feed_date {
                    return Err(BatchError::DateMismatch {
                        position,
                        expected: self.feed_date.to_string(),
                        found: found.to_string(),
                    });
                }
            }

            let link = record
                .link
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty());
            let canonical = link.as_deref().map(canonical_link);
            let key = identity_key(canonical.as_deref(), &title, &self.category, self.feed_date);

            let seen = occurrences.entry(key.clone()).or_insert(0);
            let id = format!("{key}-{seen}");
            *seen += 1;

            items.push(Item {
                id,
                key,
                title,
                link,
                canonical_link: canonical,
                category: self.category.clone(),
                fetch_date: self.feed_date,
                snippet: record
                    .snippet
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                seen_at: record.seen_at,
                position,
            });
        }

        Ok(items)
    }
}

/// Hex digest (first 16 chars of SHA-256) of an item's identity key.
fn identity_key(
    canonical_link: Option<&str>,
    title: &str,
    category: &str,
    feed_date: NaiveDate,
) -> String {
    let material = match canonical_link {
        Some(link) => format!("link\u{1f}{link}"),
        None => format!("title\u{1f}{title}\u{1f}{category}\u{1f}{feed_date}"),
    };
    let hash = Sha256::digest(material.as_bytes());
    hash[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// Canonicalize an article link so that trivially different URLs share an
/// identity.
///
/// Lowercases scheme and host, drops the fragment, `utm_*` and click-id
/// parameters, and a trailing `/` on non-root paths. Unparseable links are
/// returned trimmed.
#[must_use]
pub fn canonical_link(link: &str) -> String {
    let trimmed = link.trim();
    let Ok(mut url) = url::Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !k.starts_with("utm_") && !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

/// Parse a `YYYY-MM-DD` feed date.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the string is not a calendar date
/// in that format.
pub fn parse_feed_date(raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| ConfigError::Invalid {
        key: "feed_date".to_string(),
        reason: format!("'{raw}' is not a YYYY-MM-DD date: {e}"),
    })
}
