//! Path resolution over loosely structured records.
//!
//! Records are arbitrary JSON values. A path is a dot-delimited list of
//! segments (`invoice_data.totals.VAT_rate`); numeric segments index arrays.
//! Resolution is total: any missing segment yields `None`, never a panic.

use serde_json::Value;

/// Resolve `path` inside `record`.
///
/// An empty path returns the record itself. A `null` record resolves to
/// `None` for every path.
pub fn get<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if record.is_null() {
        return None;
    }
    if path.is_empty() {
        return Some(record);
    }

    let mut current = record;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// String form of a resolved value; missing and `null` become "".
pub fn text(record: &Value, path: &str) -> String {
    get(record, path).map(display_value).unwrap_or_default()
}

/// Numeric form of a resolved value; missing or non-numeric become 0.
pub fn number(record: &Value, path: &str) -> f64 {
    get(record, path).and_then(as_number).unwrap_or(0.0)
}

/// Identity of a record: `id`, falling back to `_id`
pub fn record_key(record: &Value) -> Option<String> {
    ["id", "_id"]
        .iter()
        .map(|field| text(record, field))
        .find(|key| !key.is_empty())
}

/// Render a value the way a list cell would show it
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => display_number(n),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

// Whole floats print without a trailing ".0" so 100.0 and 100 read the same
fn display_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Coerce a value to a finite number.
///
/// JSON numbers are taken as-is; strings are parsed after trimming. Anything
/// else, including booleans, is not numeric.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested() {
        let record = json!({"a": {"b": 5}});
        assert_eq!(get(&record, "a.b"), Some(&json!(5)));
        assert_eq!(get(&record, "a.c"), None);
        assert_eq!(get(&Value::Null, "a.b"), None);
    }

    #[test]
    fn test_get_deep_invoice_path() {
        let record = json!({
            "invoice_data": {"totals": {"Total_with_Tax": 1190.0, "VAT_rate": "19%"}}
        });
        assert_eq!(
            get(&record, "invoice_data.totals.Total_with_Tax"),
            Some(&json!(1190.0))
        );
        assert_eq!(text(&record, "invoice_data.totals.VAT_rate"), "19%");
    }

    #[test]
    fn test_get_empty_path_returns_record() {
        let record = json!({"a": 1});
        assert_eq!(get(&record, ""), Some(&record));
        assert_eq!(get(&Value::Null, ""), None);
    }

    #[test]
    fn test_get_array_index() {
        let record = json!({"lines": [{"amount": 10}, {"amount": 20}]});
        assert_eq!(get(&record, "lines.1.amount"), Some(&json!(20)));
        assert_eq!(get(&record, "lines.2.amount"), None);
        assert_eq!(get(&record, "lines.first.amount"), None);
        assert_eq!(get(&record, "lines.-1"), None);
    }

    #[test]
    fn test_get_through_scalar_is_miss() {
        let record = json!({"a": "text", "n": null});
        assert_eq!(get(&record, "a.b"), None);
        assert_eq!(get(&record, "n.b"), None);
        assert_eq!(get(&record, "n"), Some(&Value::Null));
    }

    #[test]
    fn test_text_forms() {
        let record = json!({
            "s": "Office Rent",
            "i": 100,
            "f": 100.0,
            "g": 12.5,
            "b": true,
            "n": null,
            "o": {"k": 1}
        });
        assert_eq!(text(&record, "s"), "Office Rent");
        assert_eq!(text(&record, "i"), "100");
        assert_eq!(text(&record, "f"), "100");
        assert_eq!(text(&record, "g"), "12.5");
        assert_eq!(text(&record, "b"), "true");
        assert_eq!(text(&record, "n"), "");
        assert_eq!(text(&record, "missing"), "");
        assert_eq!(text(&record, "o"), r#"{"k":1}"#);
    }

    #[test]
    fn test_number_coercion() {
        let record = json!({
            "a": 12.5,
            "b": " 40 ",
            "c": "abc",
            "d": true,
            "e": null,
            "f": "1e400"
        });
        assert_eq!(number(&record, "a"), 12.5);
        assert_eq!(number(&record, "b"), 40.0);
        assert_eq!(number(&record, "c"), 0.0);
        assert_eq!(number(&record, "d"), 0.0);
        assert_eq!(number(&record, "e"), 0.0);
        assert_eq!(number(&record, "f"), 0.0);
        assert_eq!(number(&record, "missing"), 0.0);
    }

    #[test]
    fn test_record_key() {
        assert_eq!(record_key(&json!({"id": 7})), Some("7".to_string()));
        assert_eq!(record_key(&json!({"_id": "abc"})), Some("abc".to_string()));
        assert_eq!(record_key(&json!({"id": "", "_id": "x"})), Some("x".to_string()));
        assert_eq!(record_key(&json!({"name": "n"})), None);
    }
}
