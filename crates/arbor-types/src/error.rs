use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("json error: {0}")]
    Json(String),
}
