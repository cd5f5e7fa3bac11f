/// Merges the keys of object `b` into object `a`, `b` winning on conflicts.
/// If either value is not an object, `a` is returned unchanged.
pub fn merge(a: serde_json::Value, b: serde_json::Value) -> serde_json::Value {
    match (a, b) {
        (serde_json::Value::Object(mut a_map), serde_json::Value::Object(b_map)) => {
            b_map.into_iter().for_each(|(key, value)| {
                a_map.insert(key, value);
            });
            serde_json::Value::Object(a_map)
        }
        (a, _) => a,
    }
}

pub fn merge_inplace(a: &mut serde_json::Value, b: serde_json::Value) {
    if let (serde_json::Value::Object(a_map), serde_json::Value::Object(b_map)) = (a, b) {
        b_map.into_iter().for_each(|(key, value)| {
            a_map.insert(key, value);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge() {
        let a = json!({"key1": "value1"});
        let b = json!({"key2": "value2"});
        let result = merge(a, b);
        let expected = json!({"key1": "value1", "key2": "value2"});
        assert_eq!(result, expected);
    }

    #[test]
    fn test_merge_overwrites() {
        let a = json!({"temperature": 0.1, "seed": 3});
        let b = json!({"temperature": 0.9});
        assert_eq!(merge(a, b), json!({"temperature": 0.9, "seed": 3}));
    }

    #[test]
    fn test_merge_non_object_is_noop() {
        let a = json!({"key": "value"});
        assert_eq!(merge(a.clone(), json!([1, 2, 3])), a);
    }

    #[test]
    fn test_merge_inplace() {
        let mut a = json!({"model": "llama3.2"});
        merge_inplace(&mut a, json!({"stream": false}));
        assert_eq!(a, json!({"model": "llama3.2", "stream": false}));
    }
}
