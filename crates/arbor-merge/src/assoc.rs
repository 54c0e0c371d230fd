//! Single-child updates with structural sharing.
//!
//! Every function here leaves its input untouched. When the update would not
//! change anything, the input node itself is handed back; otherwise the node
//! is shallow-copied (children are carried over by reference) and the copy
//! is modified.

use std::sync::Arc;

use arbor_types::{Key, Map, Value};

use crate::error::{MergeError, MergeResult};

/// Set `key` to `value` in a map or sequence.
///
/// Returns `collection` itself when its current child at `key` is already
/// [`same`](Value::same) as `value`. Otherwise returns a shallow copy with
/// the child replaced. A missing map entry is added, and index `len` appends
/// to a sequence; anything past `len` is an error.
pub fn assoc(collection: &Value, key: &Key, value: Value) -> MergeResult<Value> {
    // The clone shares the node, so the copy-on-write below never touches
    // the caller's tree.
    let mut out = collection.clone();
    assoc_in_place(&mut out, key, value)?;
    Ok(out)
}

/// [`assoc`], skipped entirely when the child is already `value`.
pub fn assoc_if_different(collection: &Value, key: &Key, value: Value) -> MergeResult<Value> {
    if collection.get(key).is_some_and(|current| current.same(&value)) {
        return Ok(collection.clone());
    }
    assoc(collection, key, value)
}

/// Remove `key` from a map, or the element at `key` from a sequence
/// (later elements shift down).
///
/// Returns `collection` itself when there is nothing to remove.
pub fn dissoc(collection: &Value, key: &Key) -> MergeResult<Value> {
    match collection {
        Value::Map(map) => {
            let name = key.as_name();
            if !map.contains_key(name.as_ref()) {
                return Ok(collection.clone());
            }
            let mut copy: Map = (**map).clone();
            copy.remove(name.as_ref());
            Ok(Value::Map(Arc::new(copy)))
        }
        Value::Seq(items) => match key.as_index() {
            Some(index) if index < items.len() => {
                let mut copy = (**items).clone();
                copy.remove(index);
                Ok(Value::Seq(Arc::new(copy)))
            }
            _ => Ok(collection.clone()),
        },
        other => Err(MergeError::NotACollection { kind: other.kind() }),
    }
}

/// Copy-on-write set. Returns whether `collection` changed.
///
/// The node behind `collection` is copied only if it is shared; an
/// accumulator that already owns a private copy is updated directly.
pub(crate) fn assoc_in_place(collection: &mut Value, key: &Key, value: Value) -> MergeResult<bool> {
    if collection.get(key).is_some_and(|current| current.same(&value)) {
        return Ok(false);
    }
    match collection {
        Value::Map(map) => {
            put(map, key.as_name().as_ref(), value);
            Ok(true)
        }
        Value::Seq(items) => {
            let index = key
                .as_index()
                .ok_or_else(|| MergeError::InvalidSequenceKey(key.to_string()))?;
            let len = items.len();
            if index < len {
                Arc::make_mut(items)[index] = value;
            } else if index == len {
                Arc::make_mut(items).push(value);
            } else {
                return Err(MergeError::IndexOutOfBounds { index, len });
            }
            Ok(true)
        }
        other => Err(MergeError::NotACollection { kind: other.kind() }),
    }
}

/// Map-only set used by the merger, where the key is always a name and the
/// target always a map. Returns whether the map changed.
pub(crate) fn put(map: &mut Arc<Map>, name: &str, value: Value) -> bool {
    if map.get(name).is_some_and(|current| current.same(&value)) {
        return false;
    }
    Arc::make_mut(map).insert(name.to_string(), value);
    true
}
