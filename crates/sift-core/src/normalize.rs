//! Text normalization applied before embedding, so that formatting noise
//! (markup, case, boilerplate, spacing) never changes a vector.

use std::sync::LazyLock;

use regex::Regex;

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tags regex"));

static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:read more|continue reading|click here)\b|\[(?:…|\.\.\.)\]|…|\.{3,}|\(opens in (?:a )?new (?:tab|window)\)",
    )
    .expect("valid boilerplate regex")
});

/// The last `" - Segment"` / `" | Segment"` of a headline.
static LAST_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+[-|–—]\s+([^-|–—]+)$").expect("valid last segment regex")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Normalize free text for embedding.
///
/// Strips markup, decodes common entities, lowercases, removes boilerplate
/// phrases, and collapses whitespace. May return an empty string.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let stripped = TAGS.replace_all(text, " ");

    let mut decoded = stripped.into_owned();
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    let lowered = decoded.to_lowercase();
    let cleaned = BOILERPLATE.replace_all(&lowered, " ");
    WHITESPACE.replace_all(cleaned.trim(), " ").into_owned()
}

/// Build the text embedded for an item: the headline followed by the
/// snippet when there is one.
///
/// A trailing `" - Source"` segment is dropped only when it names the site
/// the item links to (`"... - The Verge"` on `theverge.com`). Any other
/// trailing segment is headline content and is kept.
#[must_use]
pub fn embedding_text(title: &str, link: Option<&str>, snippet: Option<&str>) -> String {
    let title = title.trim();
    let headline = match LAST_SEGMENT.captures(title) {
        Some(caps) => match (caps.get(0), caps.get(1)) {
            (Some(whole), Some(segment))
                if whole.start() > 0 && names_link_site(segment.as_str(), link) =>
            {
                &title[..whole.start()]
            }
            _ => title,
        },
        None => title,
    };

    match snippet.map(str::trim).filter(|s| !s.is_empty()) {
        Some(snippet) => format!("{headline}. {snippet}"),
        None => headline.to_string(),
    }
}

/// Host labels that never identify a publisher on their own.
const GENERIC_LABELS: &[&str] = &["www", "com", "org", "net", "co", "news", "amp"];

/// Whether `segment` is an attribution for the host of `link`: its letters
/// and digits, lowercased, start with one of the host's labels.
fn names_link_site(segment: &str, link: Option<&str>) -> bool {
    let Some(host) = link
        .and_then(|l| url::Url::parse(l.trim()).ok())
        .and_then(|u| u.host_str().map(str::to_lowercase))
    else {
        return false;
    };
    let compact: String = segment
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    if compact.is_empty() {
        return false;
    }
    host.split('.')
        .filter(|label| label.len() >= 3 && !GENERIC_LABELS.contains(label))
        .map(|label| label.replace('-', ""))
        .any(|label| compact.starts_with(&label))
}
