// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Request body and query string parsing into a parameter object.
//!
//! Form and query keys use bracket nesting: `article[title]=Hi` becomes
//! `{ "article": { "title": "Hi" } }` and `tags[]=a&tags[]=b` becomes
//! `{ "tags": ["a", "b"] }`.

use serde_json::{Map, Value as JsonValue};

/// Maximum body size to accept (1MB)
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Maximum bracket nesting in a form or query key.
pub const MAX_PARAM_DEPTH: usize = 32;

/// Parses a request body based on its `Content-Type`.
///
/// Supports:
/// - `application/json` - JSON body
/// - `application/x-www-form-urlencoded` - URL-encoded form data
///
/// An empty body is `null`. Other content types are tried as JSON and
/// fall back to `null`.
pub fn parse_body(content_type: &str, bytes: &[u8]) -> Result<JsonValue, BodyParseError> {
    if bytes.is_empty() {
        return Ok(JsonValue::Null);
    }
    if content_type.contains("application/json") {
        parse_json(bytes)
    } else if content_type.contains("application/x-www-form-urlencoded") {
        Ok(JsonValue::Object(parse_form_urlencoded(bytes)?))
    } else {
        Ok(parse_json(bytes).unwrap_or(JsonValue::Null))
    }
}

/// Parses JSON body.
fn parse_json(bytes: &[u8]) -> Result<JsonValue, BodyParseError> {
    serde_json::from_slice(bytes).map_err(|e| BodyParseError::InvalidJson(e.to_string()))
}

/// Parses URL-encoded pairs with bracket nesting.
pub fn parse_form_urlencoded(bytes: &[u8]) -> Result<Map<String, JsonValue>, BodyParseError> {
    let mut params = Map::new();
    for (key, value) in form_urlencoded::parse(bytes) {
        insert_nested(&mut params, &key, JsonValue::String(value.into_owned()))?;
    }
    Ok(params)
}

/// Parses a query string the same way as a form body.
pub fn parse_query(query: Option<&str>) -> Result<Map<String, JsonValue>, BodyParseError> {
    match query {
        Some(q) => parse_form_urlencoded(q.as_bytes()),
        None => Ok(Map::new()),
    }
}

/// Inserts `value` under a bracketed key such as `a[b][]`.
///
/// Keys nested deeper than [`MAX_PARAM_DEPTH`] are rejected.
pub fn insert_nested(params: &mut Map<String, JsonValue>, key: &str, value: JsonValue) -> Result<(), BodyParseError> {
    let (head, rest) = match key.find('[') {
        Some(idx) => (&key[..idx], &key[idx..]),
        None => (key, ""),
    };
    if head.is_empty() {
        return Ok(());
    }
    if rest.matches('[').count() > MAX_PARAM_DEPTH {
        return Err(BodyParseError::TooDeep);
    }

    let segments: Vec<&str> = rest
        .split(']')
        .filter_map(|part| part.strip_prefix('['))
        .collect();
    insert_path(params, head, &segments, value);
    Ok(())
}

fn insert_path(params: &mut Map<String, JsonValue>, head: &str, segments: &[&str], value: JsonValue) {
    match segments.split_first() {
        None => {
            params.insert(head.to_string(), value);
        }
        Some((&"", _)) => {
            let slot = params
                .entry(head.to_string())
                .or_insert_with(|| JsonValue::Array(Vec::new()));
            match slot {
                JsonValue::Array(items) => items.push(value),
                other => *other = JsonValue::Array(vec![value]),
            }
        }
        Some((next, tail)) => {
            let slot = params
                .entry(head.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !slot.is_object() {
                *slot = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(inner) = slot {
                insert_path(inner, next, tail, value);
            }
        }
    }
}

/// Error types for body parsing.
#[derive(Debug, thiserror::Error)]
pub enum BodyParseError {
    /// Request body exceeds the maximum allowed size.
    #[error("Request body too large (max {MAX_BODY_SIZE} bytes)")]
    TooLarge,

    /// JSON parsing failed.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// A parameter key is nested too deeply.
    #[error("Parameter nesting too deep (max {MAX_PARAM_DEPTH} levels)")]
    TooDeep,
}
