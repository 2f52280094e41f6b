//! Incoming request validation.

use crate::config::{Settings, MAX_TOP_K};
use crate::error::ValidationError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Body fields accepted as the query, in priority order. `query` is the
/// canonical name; the others are tolerated for older clients.
pub const QUERY_FIELDS: [&str; 3] = ["query", "input", "question"];

/// A request that is ready to be forwarded upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayRequest {
    pub query: String,
    pub vector_store_id: String,
    pub model: String,
    pub top_k: u32,
}

/// Decode a raw body leniently: anything that is not a JSON object
/// becomes an empty map.
pub fn parse_body(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Validate a raw request body against the configuration snapshot.
pub fn validate(body: &[u8], settings: &Settings) -> Result<RelayRequest, ValidationError> {
    validate_fields(&parse_body(body), settings)
}

/// Validate already-decoded body fields.
pub fn validate_fields(
    fields: &Map<String, Value>,
    settings: &Settings,
) -> Result<RelayRequest, ValidationError> {
    let query = QUERY_FIELDS
        .iter()
        .find_map(|name| non_empty_str(fields, name))
        .ok_or(ValidationError::MissingQuery)?;

    let vector_store_id = if settings.relay.pin_vector_store {
        settings.relay.default_vector_store()
    } else {
        non_empty_str(fields, "vector_store_id").or(settings.relay.default_vector_store())
    }
    .ok_or(ValidationError::MissingVectorStore)?;

    let model = non_empty_str(fields, "model").unwrap_or(settings.openai.model.trim());

    let top_k = fields
        .get("top_k")
        .and_then(positive_int)
        .map(|k| k.min(MAX_TOP_K))
        .unwrap_or(settings.relay.default_top_k);

    Ok(RelayRequest {
        query: query.to_string(),
        vector_store_id: vector_store_id.to_string(),
        model: model.to_string(),
        top_k,
    })
}

fn non_empty_str<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Positive integer from a JSON number or numeric string.
fn positive_int(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;

    (n > 0).then(|| u32::try_from(n).unwrap_or(u32::MAX))
}
