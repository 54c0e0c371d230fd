//! Error types for the merge crate.

use arbor_types::ValueKind;

/// Errors that can occur when associating into a collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// The target of the operation is not a map or sequence.
    #[error("expected a map or sequence, got {kind}")]
    NotACollection { kind: ValueKind },

    /// A sequence index past the end (only `len` itself may be appended).
    #[error("index {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A non-numeric name was used to address a sequence slot.
    #[error("invalid sequence key: {0:?}")]
    InvalidSequenceKey(String),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
