//! Identity diff: which parts of a new snapshot are shared with the old one.
//!
//! Walks two trees in parallel, descending only into pairs of maps that are
//! distinct nodes. Every stop of the walk is reported: subtrees that are the
//! same node are `Shared`, and the rest are `Replaced`, `Added` or
//! `Removed`.

use std::collections::BTreeSet;

use arbor_types::{Key, Path, Value, ValueKind};
use serde::Serialize;

/// The result of comparing two snapshots by identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IdentityDiff {
    /// Every stop of the walk, in key order.
    pub changes: Vec<IdentityChange>,
}

/// One stop of the identity walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum IdentityChange {
    /// The subtree at `path` is the same node in both snapshots.
    Shared { path: Path },
    /// The value at `path` is a different node (or a different scalar).
    Replaced {
        path: Path,
        before: ValueKind,
        after: ValueKind,
    },
    /// A map entry only present in the new snapshot.
    Added { path: Path, kind: ValueKind },
    /// A map entry only present in the old snapshot.
    Removed { path: Path, kind: ValueKind },
}

impl IdentityChange {
    pub fn path(&self) -> &Path {
        match self {
            IdentityChange::Shared { path }
            | IdentityChange::Replaced { path, .. }
            | IdentityChange::Added { path, .. }
            | IdentityChange::Removed { path, .. } => path,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, IdentityChange::Shared { .. })
    }
}

impl IdentityDiff {
    /// Returns `true` if nothing but shared subtrees were found.
    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(IdentityChange::is_shared)
    }

    /// Number of non-shared stops.
    pub fn len(&self) -> usize {
        self.changes.iter().filter(|c| !c.is_shared()).count()
    }

    /// Paths of the subtrees reused as-is.
    pub fn shared(&self) -> impl Iterator<Item = &Path> {
        self.changes
            .iter()
            .filter(|c| c.is_shared())
            .map(IdentityChange::path)
    }

    /// Whether the subtree at `path` is reused from the old snapshot, either
    /// directly or because one of its ancestors is.
    pub fn is_shared(&self, path: &Path) -> bool {
        self.shared()
            .any(|shared| path.keys().starts_with(shared.keys()))
    }

    pub fn replacements(&self) -> usize {
        self.count(|c| matches!(c, IdentityChange::Replaced { .. }))
    }

    pub fn additions(&self) -> usize {
        self.count(|c| matches!(c, IdentityChange::Added { .. }))
    }

    pub fn removals(&self) -> usize {
        self.count(|c| matches!(c, IdentityChange::Removed { .. }))
    }

    fn count(&self, pred: impl Fn(&IdentityChange) -> bool) -> usize {
        self.changes.iter().filter(|c| pred(*c)).count()
    }
}

/// Compare `before` and `after` by node identity.
pub fn diff_identity(before: &Value, after: &Value) -> IdentityDiff {
    let mut changes = Vec::new();
    walk(before, after, &mut Path::root(), &mut changes);
    IdentityDiff { changes }
}

fn walk(before: &Value, after: &Value, path: &mut Path, out: &mut Vec<IdentityChange>) {
    if before.same(after) {
        out.push(IdentityChange::Shared { path: path.clone() });
        return;
    }
    let (Value::Map(old), Value::Map(new)) = (before, after) else {
        out.push(IdentityChange::Replaced {
            path: path.clone(),
            before: before.kind(),
            after: after.kind(),
        });
        return;
    };

    let names: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for name in names {
        path.push(Key::from(name));
        match (old.get(name), new.get(name)) {
            (Some(b), Some(a)) => walk(b, a, path, out),
            (Some(b), None) => out.push(IdentityChange::Removed {
                path: path.clone(),
                kind: b.kind(),
            }),
            (None, Some(a)) => out.push(IdentityChange::Added {
                path: path.clone(),
                kind: a.kind(),
            }),
            (None, None) => {}
        }
        path.pop();
    }
}
