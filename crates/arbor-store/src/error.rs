use arbor_merge::MergeError;
use arbor_types::ValueKind;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Associating a slice into the root failed.
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    /// The root state cannot hold named slices.
    #[error("state root must be a map to hold slice {slice:?}, got {kind}")]
    InvalidRoot { slice: String, kind: ValueKind },

    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A command could not be decoded.
    #[error("invalid command on line {line}: {source}")]
    InvalidCommand {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
