use sift_core::{Item, Threshold};

use crate::similarity::SimilarityEdge;
use crate::union_find::UnionFind;

/// Non-empty set of arena indices judged to describe the same story,
/// in ascending position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCluster {
    members: Vec<usize>,
}

impl DuplicateCluster {
    #[cfg(test)]
    pub(crate) fn from_members(members: Vec<usize>) -> Self {
        Self { members }
    }

    #[must_use]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Lowest position in the cluster; clusters are ordered by it.
    #[must_use]
    pub fn first(&self) -> usize {
        self.members[0]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`; present for clippy's `len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Transitive-closure clustering.
///
/// Items joined by an edge with `score >= threshold` are connected, and the
/// connected components are the clusters: A~B and B~C put A, B and C
/// together even when A and C are not similar. Items with no qualifying
/// edge come back as singletons, so the result always partitions `items`.
///
/// Members are in ascending position and clusters are ordered by their first
/// member, so the output follows batch order.
#[must_use]
pub fn cluster(items: &[Item], edges: &[SimilarityEdge], threshold: Threshold) -> Vec<DuplicateCluster> {
    let n = items.len();
    let mut forest = UnionFind::new(n);
    let mut merges = 0usize;

    for edge in edges {
        if edge.a < n && edge.b < n && edge.score >= threshold.value() && forest.union(edge.a, edge.b) {
            merges += 1;
        }
    }

    let mut slot_by_root: Vec<Option<usize>> = vec![None; n];
    let mut clusters: Vec<DuplicateCluster> = Vec::with_capacity(n - merges);
    for index in 0..n {
        let root = forest.find(index);
        match slot_by_root[root] {
            Some(slot) => clusters[slot].members.push(index),
            None => {
                slot_by_root[root] = Some(clusters.len());
                clusters.push(DuplicateCluster {
                    members: vec![index],
                });
            }
        }
    }

    tracing::debug!(
        items = n,
        edges = edges.len(),
        clusters = clusters.len(),
        threshold = threshold.value(),
        "clustered batch"
    );
    clusters
}
