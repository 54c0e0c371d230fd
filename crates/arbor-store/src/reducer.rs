use arbor_merge::{assoc_if_different, merge};
use arbor_types::{Key, Value};

use crate::command::Command;
use crate::error::{StoreError, StoreResult};

/// Apply one command to `state`.
///
/// `Write` merges (so untouched subtrees keep their identity), `Overwrite`
/// installs the payload as-is, and `Reset` installs `initial`.
pub fn reduce(state: &Value, initial: &Value, command: &Command) -> Value {
    match command {
        Command::Write(payload) => merge(state, payload),
        Command::Overwrite(payload) => payload.clone(),
        Command::Reset => initial.clone(),
    }
}

/// Apply one command to the `slice` entry of a map-shaped `root`.
///
/// A missing slice starts from `initial`. The other slices of `root` are
/// left alone, and `root` itself comes back unchanged when the slice did not
/// change.
pub fn reduce_slice(
    root: &Value,
    slice: &str,
    initial: &Value,
    command: &Command,
) -> StoreResult<Value> {
    if !matches!(root, Value::Map(_)) {
        return Err(StoreError::InvalidRoot {
            slice: slice.to_string(),
            kind: root.kind(),
        });
    }
    let key = Key::from(slice);
    let current = root.get(&key).unwrap_or(initial);
    let next = reduce(current, initial, command);
    Ok(assoc_if_different(root, &key, next)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn write_merges() {
        let state = v(json!({"a": {"x": 1}, "b": {"y": 1}}));
        let next = reduce(&state, &Value::empty_map(), &Command::Write(v(json!({"a": {"x": 2}}))));
        assert_eq!(next, v(json!({"a": {"x": 2}, "b": {"y": 1}})));
        assert!(next.get(&Key::from("b")).unwrap().same(state.get(&Key::from("b")).unwrap()));
    }

    #[test]
    fn write_of_nothing_new_keeps_state() {
        let state = v(json!({"a": {"x": 1}}));
        let next = reduce(&state, &Value::empty_map(), &Command::Write(v(json!({"a": {"x": 1}}))));
        assert!(next.same(&state));
    }

    #[test]
    fn write_of_scalar_keeps_state() {
        let state = v(json!({"a": {"x": 1}}));
        let next = reduce(&state, &Value::empty_map(), &Command::Write(Value::from(5)));
        assert!(next.same(&state));
    }

    #[test]
    fn overwrite_replaces_wholesale() {
        let state = v(json!({"a": 1, "b": 2}));
        let payload = v(json!({"c": 3}));
        let next = reduce(&state, &Value::empty_map(), &Command::Overwrite(payload.clone()));
        assert!(next.same(&payload));
    }

    #[test]
    fn reset_reinstalls_initial() {
        let initial = Value::empty_map();
        let state = v(json!({"a": 1}));
        let next = reduce(&state, &initial, &Command::Reset);
        assert!(next.same(&initial));
    }

    #[test]
    fn slice_updates_only_its_entry() {
        let root = v(json!({"cache": {"a": 1}, "ui": {"open": true}}));
        let next = reduce_slice(
            &root,
            "cache",
            &Value::empty_map(),
            &Command::Write(v(json!({"b": 2}))),
        )
        .unwrap();

        assert_eq!(next, v(json!({"cache": {"a": 1, "b": 2}, "ui": {"open": true}})));
        assert!(next.get(&Key::from("ui")).unwrap().same(root.get(&Key::from("ui")).unwrap()));
    }

    #[test]
    fn unchanged_slice_keeps_root() {
        let root = v(json!({"cache": {"a": 1}}));
        let next = reduce_slice(
            &root,
            "cache",
            &Value::empty_map(),
            &Command::Write(v(json!({"a": 1}))),
        )
        .unwrap();
        assert!(next.same(&root));
    }

    #[test]
    fn missing_slice_starts_from_initial() {
        let initial = v(json!({"seed": true}));
        let next = reduce_slice(
            &Value::empty_map(),
            "cache",
            &initial,
            &Command::Write(v(json!({"a": 1}))),
        )
        .unwrap();
        assert_eq!(next, v(json!({"cache": {"seed": true, "a": 1}})));
    }

    #[test]
    fn non_map_root_is_rejected() {
        let err = reduce_slice(&Value::from(1), "cache", &Value::empty_map(), &Command::Reset)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoot { .. }));
    }
}
