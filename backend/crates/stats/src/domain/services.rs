//! Domain Services
//!
//! Shape-agnostic extraction of numeric fields from API payloads.
//!
//! The API reports the same statistic either nested in objects
//! (`{"drugs": {"xanax": 12}}`) or as a list of `{name, value}` records,
//! depending on endpoint version. Extraction accepts both and never fails:
//! anything unreadable counts as zero.

use serde_json::Value;

/// Resolve `path` in `payload`, else look up `fallback_name` in a record array, else 0
pub fn extract(payload: &Value, path: &[&str], fallback_name: &str) -> u64 {
    if let Some(value) = resolve_path(payload, path) {
        return to_count(value);
    }

    match payload {
        Value::Array(records) => records
            .iter()
            .find(|record| record.get("name").and_then(Value::as_str) == Some(fallback_name))
            .and_then(|record| record.get("value"))
            .map(to_count)
            .unwrap_or(0),
        _ => 0,
    }
}

fn resolve_path<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.iter()
        .try_fold(payload, |node, key| node.get(*key))
        .filter(|value| !value.is_null())
}

/// Coerce a JSON value into a non-negative counter
pub fn to_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_nested_object() {
        let payload = json!({"other": {"activity": {"time": 1234}}});
        assert_eq!(extract(&payload, &["other", "activity", "time"], "timeplayed"), 1234);
    }

    #[test]
    fn test_extract_record_array() {
        let payload = json!([
            {"name": "xantaken", "value": 12},
            {"name": "timeplayed", "value": 99}
        ]);
        assert_eq!(extract(&payload, &["other", "activity", "time"], "timeplayed"), 99);
    }

    #[test]
    fn test_extract_first_matching_record_wins() {
        let payload = json!([
            {"name": "xantaken", "value": 1},
            {"name": "xantaken", "value": 2}
        ]);
        assert_eq!(extract(&payload, &["drugs", "xanax"], "xantaken"), 1);
    }

    #[test]
    fn test_extract_missing_is_zero() {
        assert_eq!(extract(&json!({"drugs": {}}), &["drugs", "xanax"], "xantaken"), 0);
        assert_eq!(extract(&json!([]), &["drugs", "xanax"], "xantaken"), 0);
        assert_eq!(extract(&json!(null), &["drugs", "xanax"], "xantaken"), 0);
        assert_eq!(extract(&json!("oops"), &["drugs", "xanax"], "xantaken"), 0);
        assert_eq!(
            extract(&json!([{"name": "xantaken"}]), &["drugs", "xanax"], "xantaken"),
            0
        );
    }

    #[test]
    fn test_extract_null_leaf_falls_through() {
        let payload = json!({"drugs": {"xanax": null}});
        assert_eq!(extract(&payload, &["drugs", "xanax"], "xantaken"), 0);
    }

    #[test]
    fn test_to_count_coercion() {
        assert_eq!(to_count(&json!(5)), 5);
        assert_eq!(to_count(&json!(-5)), 0);
        assert_eq!(to_count(&json!(7.9)), 7);
        assert_eq!(to_count(&json!("42")), 42);
        assert_eq!(to_count(&json!(true)), 0);
    }
}
