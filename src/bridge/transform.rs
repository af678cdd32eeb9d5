use serde_json::Value;

/// Rewrites argument values before they are encoded into a request body.
///
/// [`transform`](PreSerialize::transform) only sees scalar leaves; arrays and
/// objects are walked by the client and keep their shape. Returning `None`
/// leaves the value untouched.
///
/// Any `Fn(&Value) -> Option<Value>` closure is a hook:
///
/// ```
/// use serde_json::Value;
///
/// let stringify_numbers = |value: &Value| value.as_number().map(|n| Value::String(n.to_string()));
/// # let _ = stringify_numbers;
/// ```
pub trait PreSerialize: Send + Sync {
    fn transform(&self, value: &Value) -> Option<Value>;
}

impl<F> PreSerialize for F
where
    F: Fn(&Value) -> Option<Value> + Send + Sync,
{
    fn transform(&self, value: &Value) -> Option<Value> {
        self(value)
    }
}

pub(crate) fn apply_in_place(hook: &dyn PreSerialize, value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                apply_in_place(hook, item);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                apply_in_place(hook, item);
            }
        }
        leaf => {
            if let Some(replacement) = hook.transform(leaf) {
                *leaf = replacement;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stringify_numbers(value: &Value) -> Option<Value> {
        value.as_number().map(|n| Value::String(n.to_string()))
    }

    #[test]
    fn replaces_leaves_and_keeps_structure() {
        let mut value = json!({"a": [1, {"b": 2}], "c": "text", "d": null});
        apply_in_place(&stringify_numbers, &mut value);

        assert_eq!(value, json!({"a": ["1", {"b": "2"}], "c": "text", "d": null}));
    }

    #[test]
    fn none_leaves_value_untouched() {
        let mut value = json!([true, "x", 1.5]);
        apply_in_place(&|_: &Value| -> Option<Value> { None }, &mut value);

        assert_eq!(value, json!([true, "x", 1.5]));
    }

    #[test]
    fn containers_are_not_passed_to_hook() {
        let mut value = json!({"outer": [[]]});
        apply_in_place(&|v: &Value| v.is_array().then(|| json!("replaced")), &mut value);

        assert_eq!(value, json!({"outer": [[]]}));
    }
}
