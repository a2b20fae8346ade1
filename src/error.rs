use crate::model::ItemId;
use thiserror::Error;

/// Failure of one resolution session. A session either fully succeeds or
/// fails with one of these; there is no partial success.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Reading matched filters or hide records from the external store failed.
    #[error("rule lookup failed: {0}")]
    Lookup(anyhow::Error),

    /// Persisting synthesized hide records failed. The computed result is
    /// discarded; nothing was reported as succeeded.
    #[error("hide record write-back failed: {0}")]
    WriteBack(anyhow::Error),

    /// An item with a Remove disposition survived pruning. Indicates a
    /// classifier or propagation bug; checked in debug builds only.
    #[error("item {0} with Remove disposition survived pruning")]
    InvariantViolation(ItemId),
}
