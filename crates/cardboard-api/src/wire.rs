//! Serialization boundary.
//!
//! Payloads arriving from a transport are decoded here. A malformed payload is
//! fatal for that payload: decoding stops at the first problem and reports an
//! [`ApiError::Deserialization`] whose `path` points at the offending element
//! (`$.mutation`, `$.results[2]`, `$.myQuery`, ...). Nothing is coerced.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::{ApiError, QueryBatch, QueryResponse, UpdateEnvelope, UpdateResponse};

fn parse_document(json: &str) -> Result<JsonValue, ApiError> {
    serde_json::from_str(json).map_err(|e| ApiError::deserialization("$", e))
}

fn expect_object(value: JsonValue, path: &str) -> Result<Map<String, JsonValue>, ApiError> {
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(ApiError::Deserialization {
            path: path.to_string(),
            message: format!("expected an object, found {}", json_type_name(&other)),
        }),
    }
}

fn take_field(
    object: &mut Map<String, JsonValue>,
    key: &str,
    parent: &str,
) -> Result<(JsonValue, String), ApiError> {
    let path = format!("{parent}.{key}");
    match object.remove(key) {
        Some(value) => Ok((value, path)),
        None => Err(ApiError::Deserialization {
            path,
            message: "missing field".to_string(),
        }),
    }
}

fn decode_at<T: DeserializeOwned>(value: JsonValue, path: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::deserialization(path, e))
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Decode a mutation envelope `{updateId, mutation}`.
pub fn decode_envelope(json: &str) -> Result<UpdateEnvelope, ApiError> {
    let mut object = expect_object(parse_document(json)?, "$")?;

    let (update_id, path) = take_field(&mut object, "updateId", "$")?;
    let update_id = decode_at(update_id, &path)?;

    let (mutation, path) = take_field(&mut object, "mutation", "$")?;
    // Qualify the path with the mutation tag so field errors name their variant.
    let path = match mutation.get("type").and_then(JsonValue::as_str) {
        Some(tag) => format!("{path}<{tag}>"),
        None => path,
    };
    let mutation = decode_at(mutation, &path)?;

    Ok(UpdateEnvelope {
        update_id,
        mutation,
    })
}

/// Decode a named query batch, entry by entry, keeping request order.
pub fn decode_query_batch(json: &str) -> Result<QueryBatch, ApiError> {
    // `serde_json::Map` sorts its keys, so the document is read straight into
    // an insertion-ordered map instead.
    let object: IndexMap<String, JsonValue> =
        serde_json::from_str(json).map_err(|e| ApiError::deserialization("$", e))?;
    let mut batch = QueryBatch::with_capacity(object.len());
    for (name, request) in object {
        let path = format!("$.{name}");
        let request = decode_at(request, &path)?;
        batch.insert(name, request);
    }
    Ok(batch)
}

/// Decode the query endpoint's reply, result by result.
pub fn decode_query_response(json: &str) -> Result<QueryResponse, ApiError> {
    let mut object = expect_object(parse_document(json)?, "$")?;

    let (snapshot_index, path) = take_field(&mut object, "snapshotIndex", "$")?;
    let snapshot_index = decode_at(snapshot_index, &path)?;

    let (results, path) = take_field(&mut object, "results", "$")?;
    let results = match results {
        JsonValue::Array(results) => results,
        other => {
            return Err(ApiError::Deserialization {
                message: format!("expected an array, found {}", json_type_name(&other)),
                path,
            })
        }
    };
    let results = results
        .into_iter()
        .enumerate()
        .map(|(i, result)| decode_at(result, &format!("{path}[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryResponse {
        snapshot_index,
        results,
    })
}

/// Decode the update endpoint's reply.
pub fn decode_update_response(json: &str) -> Result<UpdateResponse, ApiError> {
    decode_at(parse_document(json)?, "$")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mutation, QueryRequest, QueryResult};

    fn path_of(err: ApiError) -> String {
        match err {
            ApiError::Deserialization { path, .. } => path,
            other => panic!("expected a deserialization error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_envelope() {
        let envelope = decode_envelope(
            r#"{"updateId": "u1", "mutation": {"type": "categoryReorder", "ids": ["a", "b"]}}"#,
        )
        .unwrap();
        assert_eq!(envelope.update_id.as_str(), "u1");
        assert!(matches!(envelope.mutation, Mutation::CategoryReorder(_)));
    }

    #[test]
    fn test_envelope_errors_are_path_qualified() {
        let err = decode_envelope(r#"{"mutation": {"type": "cardMove"}}"#).unwrap_err();
        assert_eq!(path_of(err), "$.updateId");

        let err = decode_envelope(
            r#"{"updateId": "u1", "mutation": {"type": "cardMove", "id": "c1", "direction": "sideways"}}"#,
        )
        .unwrap_err();
        assert_eq!(path_of(err), "$.mutation<cardMove>");

        let err = decode_envelope("[1, 2]").unwrap_err();
        assert_eq!(path_of(err), "$");

        let err = decode_envelope("{not json").unwrap_err();
        assert_eq!(path_of(err), "$");
    }

    #[test]
    fn test_decode_query_batch() {
        let batch = decode_query_batch(
            r#"{"colors": {"type": "allColors"}, "one": {"type": "card", "cardId": "c1"}}"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch["one"], QueryRequest::Card { card_id: "c1".into() });

        let err = decode_query_batch(r#"{"bad": {"type": "card"}}"#).unwrap_err();
        assert_eq!(path_of(err), "$.bad");

        let err = decode_query_batch("[1, 2]").unwrap_err();
        assert_eq!(path_of(err), "$");
    }

    #[test]
    fn test_query_batch_keeps_request_order() {
        let batch = decode_query_batch(
            r#"{"zcount": {"type": "cardChildCount", "cardId": "c1"}, "acolors": {"type": "allColors"}, "mid": {"type": "allProjects"}}"#,
        )
        .unwrap();
        let names: Vec<&str> = batch.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zcount", "acolors", "mid"]);
    }

    #[test]
    fn test_decode_query_response() {
        let response = decode_query_response(
            r#"{"snapshotIndex": 4, "results": [{"type": "count", "value": 2}]}"#,
        )
        .unwrap();
        assert_eq!(response.snapshot_index, 4);
        assert_eq!(response.results, vec![QueryResult::Count(2)]);

        let err = decode_query_response(
            r#"{"snapshotIndex": 4, "results": [{"type": "count", "value": 2}, {"type": "count", "value": "x"}]}"#,
        )
        .unwrap_err();
        assert_eq!(path_of(err), "$.results[1]");
    }

    #[test]
    fn test_decode_update_response() {
        let response = decode_update_response(r#"{"snapshotIndex": 7}"#).unwrap();
        assert_eq!(response.snapshot_index, 7);
        assert!(decode_update_response(r#"{"snapshotIndex": -1}"#).is_err());
    }
}
