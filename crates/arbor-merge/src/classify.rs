use arbor_types::Value;

/// Whether `value` takes part in structural merge.
///
/// Only present plain maps and sequences qualify. Absent values, `Null`,
/// scalars, timestamps and tagged records are opaque: they are compared by
/// identity and replaced as a whole. A tagged record stays opaque even when
/// its fields would form a perfectly good map.
pub fn is_mergeable(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_mergeable)
}
