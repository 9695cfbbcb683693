//! Result payload parsing.
//!
//! The download endpoint returns a JSON array of place records when
//! the job was submitted with `json: true`, but older backends ignore
//! the flag and return CSV. JSON is attempted first; CSV is the
//! fallback. CSV cells may themselves contain JSON-encoded review
//! arrays, which are promoted onto the record under `reviews`.

use serde_json::{Map, Value};

use crate::error::{GosomError, Result};

/// Candidate columns holding the extended review set (preferred).
const EXTENDED_REVIEW_KEYS: [&str; 2] = ["user_reviews_extended", "UserReviewsExtended"];

/// Candidate columns holding the basic review set.
const BASIC_REVIEW_KEYS: [&str; 3] = ["user_reviews", "UserReviews", "reviews"];

/// Parse a downloaded result body into place records.
pub fn parse_records(body: &str) -> Result<Vec<Value>> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(match value {
            Value::Array(items) => items,
            other => vec![other],
        });
    }

    tracing::info!("JSON parse failed, attempting CSV parse");
    parse_csv_records(body)
}

fn parse_csv_records(body: &str) -> Result<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| GosomError::Parse(e.to_string()))?
        .clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| GosomError::Parse(e.to_string()))?;
        let mut record = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            record.insert(header.to_string(), Value::String(cell.to_string()));
        }
        promote_review_cells(&mut record);
        records.push(Value::Object(record));
    }

    Ok(records)
}

/// Decode JSON-encoded review cells onto `reviews`. Extended reviews
/// take priority; the basic set is only consulted when no extended
/// reviews decoded, since the two overlap and would duplicate.
fn promote_review_cells(record: &mut Map<String, Value>) {
    let mut reviews = Vec::new();

    if let Some(parsed) = decode_review_cell(record, &EXTENDED_REVIEW_KEYS) {
        reviews = parsed;
    }

    if reviews.is_empty() {
        if let Some(parsed) = decode_review_cell(record, &BASIC_REVIEW_KEYS) {
            reviews = parsed;
        }
    }

    record.insert("reviews".to_string(), Value::Array(reviews));
}

fn decode_review_cell(record: &Map<String, Value>, keys: &[&str]) -> Option<Vec<Value>> {
    let cell = keys
        .iter()
        .find_map(|k| record.get(*k))
        .and_then(|v| v.as_str())?;
    if cell.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(cell) {
        Ok(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => None,
    }
}
