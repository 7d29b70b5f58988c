// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Normalized service results and page configuration values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::is_blank;

const SUCCESS: &str = "success";
const RESOURCE: &str = "resource";
const COLLECTION: &str = "collection";
const ERRORS: &str = "errors";
const PAGE_CONFIG: &str = "page_config";
const META: &str = "meta";

/// The normalized value produced by a service invocation.
///
/// A thin wrapper over an ordered JSON object. The well-known keys
/// (`success`, `resource`, `collection`, `errors`, `page_config`, `meta`)
/// have typed accessors; any other key a service returns is preserved and
/// serialized verbatim.
///
/// # Example
///
/// ```rust
/// use better_controller::ExecutionResult;
///
/// let result = ExecutionResult::success()
///     .with_resource(serde_json::json!({ "id": 1, "name": "X" }));
/// assert!(result.is_success_flag());
/// assert_eq!(result.resource().unwrap()["id"], 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionResult(Map<String, JsonValue>);

impl ExecutionResult {
    /// An empty result (`{}`), which counts as successful.
    pub fn new() -> Self {
        Self::default()
    }

    /// `{ "success": true }`
    pub fn success() -> Self {
        Self::new().with(SUCCESS, JsonValue::Bool(true))
    }

    /// `{ "success": false }`
    pub fn failure() -> Self {
        Self::new().with(SUCCESS, JsonValue::Bool(false))
    }

    /// Normalizes an arbitrary JSON value.
    ///
    /// `null` and non-object values become `{}`; objects are taken as-is.
    pub fn from_value(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Sets an arbitrary key.
    pub fn with(mut self, key: &str, value: JsonValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets the `resource` key.
    pub fn with_resource(self, resource: JsonValue) -> Self {
        self.with(RESOURCE, resource)
    }

    /// Sets the `collection` key.
    pub fn with_collection(self, collection: JsonValue) -> Self {
        self.with(COLLECTION, collection)
    }

    /// Sets the `errors` key.
    pub fn with_errors(self, errors: JsonValue) -> Self {
        self.with(ERRORS, errors)
    }

    /// Sets the `page_config` key.
    pub fn with_page_config(self, page_config: JsonValue) -> Self {
        self.with(PAGE_CONFIG, page_config)
    }

    /// Sets the `meta` key.
    pub fn with_meta(self, meta: JsonValue) -> Self {
        self.with(META, meta)
    }

    /// Inserts a key in place.
    pub fn insert(&mut self, key: &str, value: JsonValue) {
        self.0.insert(key.to_string(), value);
    }

    /// Reads any key.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// `false` only when the result explicitly says `"success": false`.
    pub fn is_success_flag(&self) -> bool {
        !matches!(self.0.get(SUCCESS), Some(JsonValue::Bool(false)))
    }

    /// The `resource` value, if present and not null.
    pub fn resource(&self) -> Option<&JsonValue> {
        self.present(RESOURCE)
    }

    /// The `collection` value, if present and not null.
    pub fn collection(&self) -> Option<&JsonValue> {
        self.present(COLLECTION)
    }

    /// The `errors` value, if present and not blank.
    pub fn errors(&self) -> Option<&JsonValue> {
        self.0.get(ERRORS).filter(|v| !is_blank(v))
    }

    /// The `page_config` value, if present and not null.
    pub fn page_config(&self) -> Option<&JsonValue> {
        self.present(PAGE_CONFIG)
    }

    /// The `meta` value, if present and not null.
    pub fn meta(&self) -> Option<&JsonValue> {
        self.present(META)
    }

    /// A copy with `page_config` removed and everything else untouched.
    ///
    /// This is the body the default JSON handler renders.
    pub fn without_page_config(&self) -> Self {
        let mut map = self.0.clone();
        map.shift_remove(PAGE_CONFIG);
        Self(map)
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    /// Converts into a JSON value.
    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.0)
    }

    fn present(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key).filter(|v| !v.is_null())
    }
}

impl From<JsonValue> for ExecutionResult {
    fn from(value: JsonValue) -> Self {
        Self::from_value(value)
    }
}

impl From<Map<String, JsonValue>> for ExecutionResult {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

/// Configuration for rendering a page.
///
/// Opaque to the dispatcher apart from two keys:
/// - `type`: mapped by naming convention to a registered page component
/// - `klass`: the name of a component to render directly for Turbo Frame
///   requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageConfig(Map<String, JsonValue>);

impl PageConfig {
    /// Creates an empty page config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a key.
    pub fn with(mut self, key: &str, value: JsonValue) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a key in place.
    pub fn set(&mut self, key: &str, value: JsonValue) {
        self.0.insert(key.to_string(), value);
    }

    /// Reads a key.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// The declared page type (`"index"`, `"show"`, ...).
    pub fn page_type(&self) -> Option<&str> {
        self.0.get("type").and_then(JsonValue::as_str)
    }

    /// The component to render for in-frame requests.
    pub fn klass(&self) -> Option<&str> {
        self.0
            .get("klass")
            .and_then(JsonValue::as_str)
            .filter(|k| !k.is_empty())
    }

    /// Converts into a JSON value.
    pub fn to_value(&self) -> JsonValue {
        JsonValue::Object(self.0.clone())
    }
}

impl From<Map<String, JsonValue>> for PageConfig {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

impl From<JsonValue> for PageConfig {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}
