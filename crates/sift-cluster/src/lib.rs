//! Similarity scoring, transitive-closure clustering, and representative
//! selection over one category's item arena.
//!
//! Everything here is synchronous and deterministic. Items are addressed by
//! their index in the batch arena (`&[Item]`), which is also their position.

pub mod builder;
pub mod selector;
pub mod similarity;

mod union_find;

pub use builder::{cluster, DuplicateCluster};
pub use selector::{representatives, select};
pub use similarity::{pairwise_edges, similarity, SimilarityEdge};
