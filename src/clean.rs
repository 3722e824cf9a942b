use serde_json::Value;

/// Remove `keys` from every object in `items`, returning how many fields
/// were dropped. Non-object elements are left as they are, and the
/// remaining fields keep their order.
pub fn strip_keys(items: &mut [Value], keys: &[String]) -> usize {
    let mut removed = 0;
    for item in items.iter_mut() {
        if let Value::Object(obj) = item {
            for k in keys {
                if obj.shift_remove(k).is_some() {
                    removed += 1;
                }
            }
        }
    }
    removed
}
