use serde_json::{Map, Value};

/// Shallow copy of an optional slice. `None` stays `None`.
pub fn copy_array<T: Clone>(input: Option<&[T]>) -> Option<Vec<T>> {
    input.map(<[T]>::to_vec)
}

/// Shallow copy of an optional object. `None` stays `None`.
pub fn copy_object(input: Option<&Map<String, Value>>) -> Option<Map<String, Value>> {
    input.cloned()
}

/// True for plain objects; arrays and scalars are not objects.
pub fn is_object(value: &Value) -> bool {
    value.is_object()
}

/// True when a value is falsy-like or has no own keys.
///
/// `null`, booleans and numbers carry no keys and count as empty. Strings and
/// arrays are empty when they have no elements, objects when they have no
/// keys.
pub fn object_is_empty(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Recursively merge object `sources` into `target`, left to right.
///
/// Later sources win at every leaf. Arrays and scalars are leaves and are
/// replaced wholesale. A source object landing on a non-object slot replaces
/// that slot with an empty object before merging into it. If `target` itself
/// is not an object it is left untouched.
pub fn merge_deep<'a, I>(target: &mut Value, sources: I)
where
    I: IntoIterator<Item = &'a Value>,
{
    for source in sources {
        merge_one(target, source);
    }
}

fn merge_one(target: &mut Value, source: &Value) {
    let (Value::Object(target), Value::Object(source)) = (target, source) else {
        return;
    };

    for (key, incoming) in source {
        if incoming.is_object() {
            let slot = target
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            merge_one(slot, incoming);
        } else {
            target.insert(key.clone(), incoming.clone());
        }
    }
}
