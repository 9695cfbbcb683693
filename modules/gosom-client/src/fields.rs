//! Candidate-key field resolution.
//!
//! The scraping backend has shipped several naming conventions for the
//! same logical field (`title` vs `Title` vs `name`, `stars` vs
//! `rating`). Each logical field is resolved through an ordered list
//! of candidate keys; the first present, non-empty match wins. Every
//! lookup also tries a capitalized variant of each candidate.

use serde_json::Value;

/// Resolve the first present candidate key on `record`, trying each
/// key and its capitalized variant. Null values are skipped.
pub fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let obj = record.as_object()?;
    for key in keys {
        for variant in [key.to_string(), capitalize(key)] {
            if let Some(v) = obj.get(&variant) {
                if !v.is_null() {
                    return Some(v);
                }
            }
        }
    }
    None
}

/// Resolve a string field. Non-string scalars are stringified; empty
/// strings are treated as absent so later candidates can fill in.
pub fn field_str(record: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        for variant in [key.to_string(), capitalize(key)] {
            let v = match record.get(&variant) {
                Some(v) => v,
                None => continue,
            };
            let s = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            if !s.is_empty() {
                return Some(s);
            }
        }
    }
    None
}

/// Resolve a numeric field. Accepts numbers and numeric strings (the
/// CSV fallback yields everything as strings).
pub fn field_f64(record: &Value, keys: &[&str]) -> Option<f64> {
    match field(record, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Resolve an integer field, tolerating floats and numeric strings.
pub fn field_i64(record: &Value, keys: &[&str]) -> Option<i64> {
    match field(record, keys)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_candidate_wins() {
        let record = json!({"title": "Luigi's", "name": "Wrong"});
        assert_eq!(
            field_str(&record, &["title", "name"]),
            Some("Luigi's".to_string())
        );
    }

    #[test]
    fn capitalized_variant_is_tried() {
        let record = json!({"Title": "Luigi's"});
        assert_eq!(
            field_str(&record, &["title", "name"]),
            Some("Luigi's".to_string())
        );
    }

    #[test]
    fn empty_string_falls_through_to_later_candidate() {
        let record = json!({"title": "", "name": "Luigi's"});
        assert_eq!(
            field_str(&record, &["title", "name"]),
            Some("Luigi's".to_string())
        );
    }

    #[test]
    fn numeric_field_accepts_strings_and_numbers() {
        let record = json!({"totalScore": "4.5"});
        assert_eq!(field_f64(&record, &["totalScore", "rating"]), Some(4.5));
        let record = json!({"rating": 4.5});
        assert_eq!(field_f64(&record, &["totalScore", "rating"]), Some(4.5));
    }

    #[test]
    fn integer_field_tolerates_floats() {
        let record = json!({"reviewsCount": 812.0});
        assert_eq!(field_i64(&record, &["reviewsCount"]), Some(812));
        let record = json!({"reviewsCount": "812"});
        assert_eq!(field_i64(&record, &["reviewsCount"]), Some(812));
    }

    #[test]
    fn missing_and_null_resolve_to_none() {
        let record = json!({"title": null});
        assert_eq!(field_str(&record, &["title"]), None);
        assert_eq!(field_f64(&record, &["rating"]), None);
    }
}
