use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::item::Item;

/// A representative article as written to the sink. Items collected
/// without a link are written with the `link` key omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl From<&Item> for ArticleRef {
    fn from(item: &Item) -> Self {
        Self {
            title: item.title.clone(),
            link: item.link.clone(),
        }
    }
}

/// Deduplicated result for one category on one feed date.
///
/// `article_count` is the number of duplicate clusters, which is always
/// `articles.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOutput {
    pub category: String,
    pub fetch_date: NaiveDate,
    pub article_count: usize,
    pub articles: Vec<ArticleRef>,
}

impl CategoryOutput {
    #[must_use]
    pub fn new(category: impl Into<String>, fetch_date: NaiveDate, articles: Vec<ArticleRef>) -> Self {
        Self {
            category: category.into(),
            fetch_date,
            article_count: articles.len(),
            articles,
        }
    }

    /// Serialize as pretty JSON with a trailing newline.
    ///
    /// Field order is fixed by the struct, so identical outputs always
    /// serialize to identical bytes.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
