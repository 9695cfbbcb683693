use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Trait for types usable as a Gemini structured-output target.
///
/// Automatically implemented for any `JsonSchema + DeserializeOwned`
/// type. Gemini accepts an OpenAPI 3.0 schema subset, so the schemars
/// output is reduced to the keys the API understands, `$ref`s and
/// metadata stripped, and every property marked required.
pub trait ResponseSchema: JsonSchema + DeserializeOwned {
    fn response_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();
        sanitize(&mut value);
        value
    }
}

impl<T: JsonSchema + DeserializeOwned> ResponseSchema for T {}

/// Keys Gemini's schema subset understands. Everything else is dropped.
const ALLOWED_KEYS: [&str; 6] = [
    "type",
    "description",
    "properties",
    "required",
    "items",
    "enum",
];

fn sanitize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|k, _| ALLOWED_KEYS.contains(&k.as_str()));

            if map.get("type") == Some(&Value::String("object".to_string())) {
                if let Some(Value::Object(props)) = map.get("properties") {
                    let all_keys: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".to_string(), Value::Array(all_keys));
                }
            }

            for (_, v) in map.iter_mut() {
                sanitize(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                sanitize(item);
            }
        }
        _ => {}
    }
}
