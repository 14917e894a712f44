//! Error types for clustering.

/// Errors that can occur while building indices or running the clustering pipeline.
///
/// Every variant is raised synchronously by the operation that detected it.
/// Nothing is retried internally and no variant is downgraded to a partial result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClueError {
    /// A clustering or kernel parameter is outside its valid domain.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// An argument is unusable for the requested operation
    /// (empty associative index, empty point set, wrong flag count).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two cooperating buffers disagree on their length.
    #[error("size mismatch for {what}: expected {expected}, found {found}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// A coordinate dimension index is not below `ndim`.
    #[error("dimension {dim} out of range for {ndim}-dimensional points")]
    DimensionOutOfRange { dim: usize, ndim: usize },

    /// An associative-index key is outside `[0, bins)`.
    #[error("key {key} out of range for an index with {bins} bins")]
    KeyOutOfRange { key: i64, bins: usize },

    /// Cluster ids were requested before the pipeline ran on these points.
    #[error("points have not been clustered yet")]
    NotClustered,

    /// A bounded per-seed traversal stack ran out of room.
    #[error("traversal stack for seed {seed} exceeded its capacity of {capacity}")]
    TraversalStackOverflow { seed: u32, capacity: usize },

    /// More seeds were pushed than the registry was sized for.
    #[error("seed registry overflow: capacity {capacity}")]
    SeedRegistryOverflow { capacity: usize },
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, ClueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ClueError::SizeMismatch {
            what: "host/device points",
            expected: 10,
            found: 12,
        };
        assert_eq!(
            err.to_string(),
            "size mismatch for host/device points: expected 10, found 12"
        );

        let err = ClueError::KeyOutOfRange { key: 7, bins: 4 };
        assert_eq!(err.to_string(), "key 7 out of range for an index with 4 bins");
    }
}
