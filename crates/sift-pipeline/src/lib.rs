//! Per-category dedup orchestration: load, embed, cluster, resolve, emit.
//!
//! [`Pipeline::run`] drives every category for a feed date through the
//! [`CategoryState`] machine, isolating failures to the category they
//! happen in. Only a dimension mismatch or a failure to list categories
//! aborts the run.

pub mod cancel;
pub mod error;
pub mod orchestrator;
pub mod state;
pub mod store;

pub use cancel::CancelToken;
pub use error::{CategoryError, IllegalTransition, PipelineError, StoreError};
pub use orchestrator::{CategoryFailure, CategorySuccess, Pipeline, RunOptions, RunReport};
pub use state::CategoryState;
pub use store::{BatchSource, FsStore, OutputSink};
