// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The standard JSON envelope.
//!
//! ```text
//! success: { "data": <any>, "meta": { "version": "v1", ...extra } }
//! error:   { "data": { "error": <formatted> }, "meta": { "version": "v1", ...extra } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

use crate::error::ActionError;
use crate::response::ControllerResponse;

/// ActiveModel-style validation errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelErrors {
    /// Human readable messages (`"Name can't be blank"`).
    pub full_messages: Vec<String>,
    /// Structured details per attribute.
    pub details: Map<String, JsonValue>,
}

impl ModelErrors {
    /// Builds model errors from a `{ field: [messages] }` map.
    pub fn from_field_errors(errors: &JsonValue) -> Self {
        let details = match errors {
            JsonValue::Object(map) => map.clone(),
            _ => Map::new(),
        };
        Self {
            full_messages: crate::turbo::error_messages(errors),
            details,
        }
    }
}

/// Something that can be reported in an error envelope.
#[derive(Debug, Clone)]
pub enum ErrorPayload<'a> {
    /// An error value: formatted as `{ type, message }`.
    Exception(&'a ActionError),
    /// A plain message: formatted as `{ message }`.
    Message(String),
    /// A JSON object: passed through verbatim.
    Map(JsonValue),
    /// Model errors: formatted as `{ messages, details }`.
    Model(ModelErrors),
}

impl ErrorPayload<'_> {
    /// The value placed under `data.error`.
    pub fn format(&self) -> JsonValue {
        match self {
            Self::Exception(err) => json!({ "type": err.type_name(), "message": err.to_string() }),
            Self::Message(message) => json!({ "message": message }),
            Self::Map(value) => value.clone(),
            Self::Model(errors) => json!({
                "messages": errors.full_messages,
                "details": errors.details,
            }),
        }
    }
}

impl From<String> for ErrorPayload<'_> {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for ErrorPayload<'_> {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl<'a> From<&'a ActionError> for ErrorPayload<'a> {
    fn from(err: &'a ActionError) -> Self {
        Self::Exception(err)
    }
}

/// Builds the `meta` object: the version first, then extra keys.
///
/// Non-object `extra` values are ignored.
pub fn meta(version: &str, extra: Option<&JsonValue>) -> JsonValue {
    let mut meta = Map::new();
    meta.insert("version".to_string(), JsonValue::String(version.to_string()));
    if let Some(JsonValue::Object(extra)) = extra {
        for (k, v) in extra {
            meta.insert(k.clone(), v.clone());
        }
    }
    JsonValue::Object(meta)
}

/// `{ "data": data, "meta": { "version": .., ..extra } }`
pub fn success_envelope(data: JsonValue, extra_meta: Option<&JsonValue>, version: &str) -> JsonValue {
    json!({ "data": data, "meta": meta(version, extra_meta) })
}

/// `{ "data": { "error": formatted }, "meta": { "version": .., ..extra } }`
pub fn error_envelope(payload: &ErrorPayload<'_>, extra_meta: Option<&JsonValue>, version: &str) -> JsonValue {
    json!({ "data": { "error": payload.format() }, "meta": meta(version, extra_meta) })
}

/// A JSON response carrying a success envelope.
pub fn respond_with_success(data: JsonValue, status: u16, extra_meta: Option<&JsonValue>, version: &str) -> ControllerResponse {
    ControllerResponse::json(status, success_envelope(data, extra_meta, version))
}

/// A JSON response carrying an error envelope.
pub fn respond_with_error(
    payload: &ErrorPayload<'_>,
    status: u16,
    extra_meta: Option<&JsonValue>,
    version: &str,
) -> ControllerResponse {
    ControllerResponse::json(status, error_envelope(payload, extra_meta, version))
}
