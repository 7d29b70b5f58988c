// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Parameter bag construction with permit lists.

use serde_json::{Map, Value as JsonValue};

use crate::error::ActionError;

/// One entry of a permit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermitSpec {
    /// A scalar field (`name`).
    Key(String),
    /// An array of scalars (`tags: []`).
    Array(String),
    /// A nested object, or an array of objects, with its own permit list.
    Nested(String, Vec<PermitSpec>),
}

impl PermitSpec {
    /// Shorthand for [`PermitSpec::Key`].
    pub fn key(name: impl Into<String>) -> Self {
        Self::Key(name.into())
    }

    /// Shorthand for [`PermitSpec::Array`].
    pub fn array(name: impl Into<String>) -> Self {
        Self::Array(name.into())
    }

    /// Shorthand for [`PermitSpec::Nested`].
    pub fn nested(name: impl Into<String>, fields: Vec<PermitSpec>) -> Self {
        Self::Nested(name.into(), fields)
    }

    fn name(&self) -> &str {
        match self {
            Self::Key(n) | Self::Array(n) | Self::Nested(n, _) => n,
        }
    }
}

impl From<&str> for PermitSpec {
    fn from(name: &str) -> Self {
        Self::Key(name.to_string())
    }
}

/// Builds the parameter bag handed to a service.
///
/// - `id` is copied from the raw parameters when present.
/// - With a `params_key`, the object under that key is filtered and merged.
///   A missing or non-object value is a validation error.
/// - Without one, the whole parameter set is filtered and merged.
///
/// An empty permit list keeps everything.
pub fn build_params(
    raw: &JsonValue,
    params_key: Option<&str>,
    permitted: &[PermitSpec],
) -> Result<JsonValue, ActionError> {
    let mut bag = Map::new();

    if let Some(id) = raw.get("id").filter(|v| !v.is_null()) {
        bag.insert("id".to_string(), id.clone());
    }

    let source = match params_key {
        Some(key) => match raw.get(key) {
            Some(JsonValue::Object(map)) => map,
            _ => {
                return Err(ActionError::validation(
                    format!("param is missing or the value is empty: {}", key),
                    serde_json::json!({ key: ["is missing"] }),
                ));
            }
        },
        None => match raw {
            JsonValue::Object(map) => map,
            _ => return Ok(JsonValue::Object(bag)),
        },
    };

    let filtered = if permitted.is_empty() {
        source.clone()
    } else {
        permit(source, permitted)
    };
    bag.extend(filtered);

    Ok(JsonValue::Object(bag))
}

/// Filters an object against a permit list, keeping permit-list order.
pub fn permit(source: &Map<String, JsonValue>, permitted: &[PermitSpec]) -> Map<String, JsonValue> {
    let mut out = Map::new();
    for spec in permitted {
        let Some(value) = source.get(spec.name()) else {
            continue;
        };
        let kept = match spec {
            PermitSpec::Key(_) => is_scalar(value).then(|| value.clone()),
            PermitSpec::Array(_) => match value {
                JsonValue::Array(items) if items.iter().all(is_scalar) => Some(value.clone()),
                _ => None,
            },
            PermitSpec::Nested(_, fields) => match value {
                JsonValue::Object(map) => Some(JsonValue::Object(permit(map, fields))),
                JsonValue::Array(items) => Some(JsonValue::Array(
                    items
                        .iter()
                        .filter_map(|item| item.as_object().map(|m| JsonValue::Object(permit(m, fields))))
                        .collect(),
                )),
                _ => None,
            },
        };
        if let Some(kept) = kept {
            out.insert(spec.name().to_string(), kept);
        }
    }
    out
}

fn is_scalar(value: &JsonValue) -> bool {
    !matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_is_merged() {
        let raw = json!({ "id": 5, "user": { "name": "Ada" } });
        let bag = build_params(&raw, Some("user"), &[]).unwrap();
        assert_eq!(bag, json!({ "id": 5, "name": "Ada" }));
    }

    #[test]
    fn test_whole_params_without_key() {
        let raw = json!({ "q": "rust", "page": 2 });
        let bag = build_params(&raw, None, &[]).unwrap();
        assert_eq!(bag, raw);
    }

    #[test]
    fn test_permit_list_filters() {
        let raw = json!({ "user": { "name": "Ada", "admin": true, "email": "a@b.c" } });
        let permitted = vec![PermitSpec::key("name"), PermitSpec::key("email")];
        let bag = build_params(&raw, Some("user"), &permitted).unwrap();
        assert_eq!(bag, json!({ "name": "Ada", "email": "a@b.c" }));
    }

    #[test]
    fn test_scalar_key_rejects_structures() {
        let raw = json!({ "name": { "first": "Ada" } });
        let bag = build_params(&raw, None, &[PermitSpec::key("name")]).unwrap();
        assert_eq!(bag, json!({}));
    }

    #[test]
    fn test_array_and_nested() {
        let raw = json!({
            "post": {
                "tags": ["a", "b"],
                "bad_tags": [{"x": 1}],
                "author": { "name": "Ada", "role": "admin" },
                "comments": [{ "body": "hi", "spam": true }]
            }
        });
        let permitted = vec![
            PermitSpec::array("tags"),
            PermitSpec::array("bad_tags"),
            PermitSpec::nested("author", vec![PermitSpec::key("name")]),
            PermitSpec::nested("comments", vec![PermitSpec::key("body")]),
        ];
        let bag = build_params(&raw, Some("post"), &permitted).unwrap();
        assert_eq!(
            bag,
            json!({
                "tags": ["a", "b"],
                "author": { "name": "Ada" },
                "comments": [{ "body": "hi" }]
            })
        );
    }

    #[test]
    fn test_missing_params_key_is_validation_error() {
        let err = build_params(&json!({}), Some("user"), &[]).unwrap_err();
        assert!(matches!(err, ActionError::Validation { .. }));
        assert_eq!(err.to_string(), "param is missing or the value is empty: user");
    }
}
