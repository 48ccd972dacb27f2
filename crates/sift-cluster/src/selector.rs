use std::cmp::Ordering;

use sift_core::Item;

use crate::builder::DuplicateCluster;

/// Pick the item that speaks for `cluster`.
///
/// Preference, first difference wins: longest trimmed snippet (in chars,
/// missing counts as 0), then earliest `seen_at` (missing sorts last), then
/// earliest ingest `position`, then smallest `id`. Positions and ids are
/// unique within a batch, so this is a total order and the choice never
/// depends on member order.
#[must_use]
pub fn select<'a>(items: &'a [Item], cluster: &DuplicateCluster) -> &'a Item {
    let mut best = &items[cluster.first()];
    for &index in &cluster.members()[1..] {
        let candidate = &items[index];
        if preference(candidate, best) == Ordering::Less {
            best = candidate;
        }
    }
    best
}

/// One representative per cluster, in cluster order.
#[must_use]
pub fn representatives<'a>(items: &'a [Item], clusters: &[DuplicateCluster]) -> Vec<&'a Item> {
    clusters.iter().map(|c| select(items, c)).collect()
}

/// `Less` means `a` is the better representative.
fn preference(a: &Item, b: &Item) -> Ordering {
    b.snippet_len()
        .cmp(&a.snippet_len())
        .then_with(|| match (a.seen_at, b.seen_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.position.cmp(&b.position))
        .then_with(|| a.id.cmp(&b.id))
}
