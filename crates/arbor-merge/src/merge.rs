//! Recursive merge with structural sharing.
//!
//! `merge(target, source)` folds every entry of `source` into `target`.
//! Pairs of plain maps are merged recursively; everything else (opaque
//! values, sequences, shape changes) is taken from `source` as a whole. Any
//! subtree of `target` the fold did not change comes back as the very same
//! node, and if nothing changed at all the result *is* `target`.

use std::sync::Arc;

use arbor_types::Value;
use tracing::{debug, trace};

use crate::assoc::put;
use crate::classify::is_mergeable;

/// Merge two possibly-absent values.
///
/// When either side is absent the target is returned as it is, so a missing
/// source leaves the target alone and a missing target stays missing.
pub fn merge_opt(target: Option<&Value>, source: Option<&Value>) -> Option<Value> {
    match (target, source) {
        (Some(target), Some(source)) => Some(merge(target, source)),
        (target, _) => target.cloned(),
    }
}

/// Merge `source` into `target`.
///
/// - A `Null` on either side returns `target` unchanged.
/// - An opaque `source` (scalar, timestamp, tagged record) has no entries to
///   fold in, so `target` comes back unchanged.
/// - Two maps are folded key by key (see below).
/// - Any other pairing of containers returns `target` if the two are the
///   same node and `source` otherwise; sequences are never merged
///   element-wise.
///
/// For each entry `s` of a source map and the target's entry `t` under the
/// same name:
///
/// - both mergeable and the same node: nothing to do;
/// - both mergeable and `s` a sequence: `s` replaces `t`;
/// - both mergeable maps: the entry becomes `merge(t, s)`;
/// - otherwise: `s` replaces `t`.
///
/// Entries only present in the target are kept untouched.
pub fn merge(target: &Value, source: &Value) -> Value {
    let merged = merge_at(target, source, 0);
    if !merged.same(target) {
        debug!(kind = %merged.kind(), "merge produced a new tree");
    }
    merged
}

fn merge_at(target: &Value, source: &Value, depth: usize) -> Value {
    if target.is_null() || !source.is_mergeable() {
        return target.clone();
    }
    let (Value::Map(target_map), Value::Map(source_map)) = (target, source) else {
        return if source.same(target) {
            target.clone()
        } else {
            source.clone()
        };
    };
    if Arc::ptr_eq(target_map, source_map) {
        return target.clone();
    }

    // Starts out sharing the target's node; `put` copies it on the first
    // change and updates that private copy afterwards.
    let mut acc = Arc::clone(target_map);
    for (name, s) in source_map.iter() {
        let t = acc.get(name);
        let replacement = if is_mergeable(t) && is_mergeable(Some(s)) {
            match t {
                Some(t) if t.same(s) => continue,
                Some(t) if matches!(s, Value::Map(_)) => merge_at(t, s, depth + 1),
                _ => s.clone(),
            }
        } else {
            s.clone()
        };
        if put(&mut acc, name, replacement) {
            trace!(key = %name, depth, "field replaced");
        }
    }
    Value::Map(acc)
}
