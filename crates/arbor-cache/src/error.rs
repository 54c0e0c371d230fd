use arbor_merge::MergeError;
use arbor_store::StoreError;

/// Errors from cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
