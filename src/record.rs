//! Canonical record shape and the validator that produces it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::category::{Category, CategoryMap};
use crate::errors::{PrepError, PrepResult};

/// A record in canonical form: integer `uri`, and all five categories
/// present under both `spans` and `summaries`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub uri: i64,
    pub spans: CategoryMap<Vec<String>>,
    pub summaries: CategoryMap<String>,
}

/// Parse a `uri` value the way upstream files write it: either a JSON
/// integer or a (possibly quoted) numeric string.
pub fn parse_uri(value: &Value) -> Option<i64> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.trim_matches('"').trim().parse::<i64>().ok()
}

/// Validate one raw record and build its canonical form.
///
/// `source` and `position` (1-based) only feed the error message. The raw
/// value is never modified.
pub fn normalize(raw: &Value, source: &str, position: usize) -> PrepResult<Record> {
    let obj = raw
        .as_object()
        .ok_or_else(|| PrepError::validation(source, position, "Entry must be a JSON object"))?;

    let uri_value = obj.get("uri").ok_or_else(|| {
        PrepError::validation(source, position, "Missing required field 'uri'")
    })?;
    let uri = parse_uri(uri_value).ok_or_else(|| {
        PrepError::validation(source, position, format!("Invalid URI format: {uri_value}"))
    })?;

    let spans_obj = required_object(obj, "spans", source, position)?;
    let mut spans: CategoryMap<Vec<String>> = CategoryMap::default();
    for category in Category::ALL {
        let Some(value) = spans_obj.get(category.as_str()) else {
            continue;
        };
        let items = value.as_array().ok_or_else(|| {
            PrepError::validation(
                source,
                position,
                format!("Spans category {category} must be an array"),
            )
        })?;
        *spans.get_mut(category) = items.iter().map(span_text).collect();
    }

    let summaries_obj = required_object(obj, "summaries", source, position)?;
    let mut summaries: CategoryMap<String> = CategoryMap::default();
    for category in Category::ALL {
        let Some(value) = summaries_obj.get(category.as_str()) else {
            continue;
        };
        let text = value.as_str().ok_or_else(|| {
            PrepError::validation(
                source,
                position,
                format!("Summary category {category} must be a string"),
            )
        })?;
        *summaries.get_mut(category) = text.to_string();
    }

    Ok(Record {
        uri,
        spans,
        summaries,
    })
}

fn required_object<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    source: &str,
    position: usize,
) -> PrepResult<&'a Map<String, Value>> {
    let value = obj.get(field).ok_or_else(|| {
        PrepError::validation(source, position, format!("Missing required field '{field}'"))
    })?;
    value.as_object().ok_or_else(|| {
        PrepError::validation(source, position, format!("Field '{field}' must be an object"))
    })
}

// non-string span items keep their JSON text
fn span_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fills_missing_categories() {
        let raw = json!({
            "uri": "12",
            "spans": {"CAUSE": ["stress", 3]},
            "summaries": {"SUGGESTION": "Rest more."}
        });
        let record = normalize(&raw, "output_1.json", 1).unwrap();
        assert_eq!(record.uri, 12);
        assert_eq!(record.spans.cause, vec!["stress".to_string(), "3".to_string()]);
        assert!(record.spans.experience.is_empty());
        assert_eq!(record.summaries.suggestion, "Rest more.");
        assert_eq!(record.summaries.question, "");
    }

    #[test]
    fn quoted_uri_strings_parse() {
        assert_eq!(parse_uri(&json!("\"42\"")), Some(42));
        assert_eq!(parse_uri(&json!(" 7 ")), Some(7));
        assert_eq!(parse_uri(&json!(7)), Some(7));
        assert_eq!(parse_uri(&json!(7.5)), None);
        assert_eq!(parse_uri(&json!("abc")), None);
        assert_eq!(parse_uri(&json!(null)), None);
    }

    #[test]
    fn error_names_file_and_position() {
        let raw = json!({"spans": {}, "summaries": {}});
        let err = normalize(&raw, "output_3.json", 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required field 'uri' in file output_3.json, entry 4"
        );
    }

    #[test]
    fn rejects_wrong_types() {
        let bad_spans = json!({"uri": 1, "spans": {"CAUSE": "x"}, "summaries": {}});
        let err = normalize(&bad_spans, "f.json", 1).unwrap_err();
        assert!(err.to_string().contains("Spans category CAUSE must be an array"));

        let bad_summary = json!({"uri": 1, "spans": {}, "summaries": {"CAUSE": ["x"]}});
        let err = normalize(&bad_summary, "f.json", 2).unwrap_err();
        assert!(err.to_string().contains("Summary category CAUSE must be a string"));

        let missing = json!({"uri": 1, "spans": {}});
        let err = normalize(&missing, "f.json", 3).unwrap_err();
        assert!(err.to_string().contains("'summaries'"));
    }

    #[test]
    fn input_is_not_modified() {
        let raw = json!({"uri": "5", "spans": {"OTHER": []}, "summaries": {}});
        let before = raw.clone();
        normalize(&raw, "f.json", 1).unwrap();
        assert_eq!(raw, before);
    }
}
