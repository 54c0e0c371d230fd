use arbor_types::Value;

use crate::error::CacheResult;

/// A cache of records keyed by data id, stored as one top-level mapping.
///
/// Implementations must keep the identity guarantees of the merge engine:
/// - `get` returns the stored record itself, not a copy.
/// - Setting a record to the value it already holds leaves the top-level
///   mapping as the same node.
/// - Records untouched by a write keep their identity.
pub trait NormalizedCache: Send + Sync {
    /// The record stored under `id`, if any.
    fn get(&self, id: &str) -> Option<Value>;

    /// Store `value` under `id`, replacing any previous record.
    fn set(&self, id: &str, value: Value) -> CacheResult<()>;

    /// Remove the record under `id`. Removing a missing id is a no-op.
    fn delete(&self, id: &str) -> CacheResult<()>;

    /// Drop every record and go back to the initial contents.
    fn clear(&self) -> CacheResult<()>;

    /// The whole top-level mapping.
    fn to_object(&self) -> Value;

    /// Install `contents` as the top-level mapping, or clear when `None`.
    fn replace(&self, contents: Option<Value>) -> CacheResult<()>;

    /// Merge `payload` into the top-level mapping.
    fn write(&self, payload: Value) -> CacheResult<()>;

    /// Whether a record is stored under `id`.
    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}
