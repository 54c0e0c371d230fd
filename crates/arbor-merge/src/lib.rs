//! Structural-sharing merge engine for Arbor.
//!
//! Produces new versions of a value tree while reusing, by reference, every
//! subtree that did not change. Consumers can then compare snapshots with
//! [`Value::same`](arbor_types::Value::same) and skip work for untouched
//! branches.
//!
//! # Key Operations
//!
//! - [`is_mergeable`] -- Classifier: plain map/sequence versus opaque value
//! - [`assoc`] / [`assoc_if_different`] / [`dissoc`] -- Set or remove one child with minimal copying
//! - [`merge`] / [`merge_opt`] -- Recursive merge of a source tree into a target tree
//! - [`diff_identity`] -- Report which subtrees of a result are shared with the original

pub mod assoc;
pub mod classify;
pub mod diff;
pub mod error;
pub mod merge;

pub use assoc::{assoc, assoc_if_different, dissoc};
pub use classify::is_mergeable;
pub use diff::{diff_identity, IdentityChange, IdentityDiff};
pub use error::{MergeError, MergeResult};
pub use merge::{merge, merge_opt};
