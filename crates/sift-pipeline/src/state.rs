use crate::error::IllegalTransition;

/// Progress of one category through the pipeline.
///
/// `Pending → Loaded → Embedded → Clustered → Resolved → Emitted`, with
/// `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryState {
    Pending,
    Loaded,
    Embedded,
    Clustered,
    Resolved,
    Emitted,
    Failed,
}

impl CategoryState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Emitted | Self::Failed)
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalTransition`] for anything but the next stage in line
    /// or `Failed` from a non-terminal state.
    pub fn advance(self, next: Self) -> Result<Self, IllegalTransition> {
        let allowed = match (self, next) {
            (Self::Pending, Self::Loaded)
            | (Self::Loaded, Self::Embedded)
            | (Self::Embedded, Self::Clustered)
            | (Self::Clustered, Self::Resolved)
            | (Self::Resolved, Self::Emitted) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        };
        if allowed {
            Ok(next)
        } else {
            Err(IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for CategoryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Loaded => "loaded",
            Self::Embedded => "embedded",
            Self::Clustered => "clustered",
            Self::Resolved => "resolved",
            Self::Emitted => "emitted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
