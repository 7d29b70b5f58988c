// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Platform-agnostic request passed to controller actions.
//!
//! Host adapters build an [`ActionRequest`] from their own request type and
//! hand it to [`Controller::execute`](crate::Controller::execute).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;

/// The negotiated response format of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Full page HTML.
    Html,
    /// `text/vnd.turbo-stream.html`
    TurboStream,
    /// HTML requested from inside a `<turbo-frame>`.
    TurboFrame,
    /// `application/json`
    Json,
    /// `text/csv`
    Csv,
    /// `application/xml`
    Xml,
}

impl ResponseFormat {
    /// Picks a format from an explicit format parameter, the `Accept` header
    /// and whether the request came from a Turbo Frame.
    ///
    /// An explicit format (`?format=json`, `/users.csv`) wins over `Accept`.
    /// HTML requests carrying the frame header become [`ResponseFormat::TurboFrame`].
    pub fn negotiate(format_param: Option<&str>, accept: Option<&str>, frame_request: bool) -> Self {
        let explicit = format_param.and_then(Self::from_extension);
        let format = explicit
            .or_else(|| accept.and_then(Self::from_accept))
            .unwrap_or(Self::Html);

        if format == Self::Html && frame_request {
            Self::TurboFrame
        } else {
            format
        }
    }

    /// Maps a format name or extension (`json`, `csv`, `turbo_stream`, ...).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "html" => Some(Self::Html),
            "turbo_stream" => Some(Self::TurboStream),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    fn from_accept(accept: &str) -> Option<Self> {
        // first recognized media type wins, in header order
        accept.split(',').find_map(|part| {
            let media = part.split(';').next().unwrap_or("").trim();
            match media {
                "text/vnd.turbo-stream.html" => Some(Self::TurboStream),
                "application/json" => Some(Self::Json),
                "text/csv" => Some(Self::Csv),
                "application/xml" | "text/xml" => Some(Self::Xml),
                "text/html" | "application/xhtml+xml" => Some(Self::Html),
                _ => None,
            }
        })
    }

    /// MIME type written in the `Content-Type` header.
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Html | Self::TurboFrame => "text/html; charset=utf-8",
            Self::TurboStream => "text/vnd.turbo-stream.html; charset=utf-8",
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xml => "application/xml; charset=utf-8",
        }
    }

    /// Snake-case name of the format.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::TurboStream => "turbo_stream",
            Self::TurboFrame => "turbo_frame",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request as seen by a controller action.
///
/// # Example
///
/// ```rust
/// use better_controller::{ActionRequest, ResponseFormat};
///
/// let request = ActionRequest::new("POST", "/users")
///     .with_params(serde_json::json!({ "user": { "name": "Ada" } }))
///     .with_format(ResponseFormat::Json)
///     .with_current_user(serde_json::json!({ "id": 7 }));
/// assert_eq!(request.param("user").unwrap()["name"], "Ada");
/// ```
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// HTTP method (upper case).
    pub method: String,

    /// Request path.
    pub path: String,

    /// Merged path, query and body parameters as a JSON object.
    pub params: JsonValue,

    /// Request headers. Lookups through [`ActionRequest::header`] ignore case.
    pub headers: HashMap<String, String>,

    /// Negotiated response format.
    pub format: ResponseFormat,

    /// The authenticated user, if any.
    pub current_user: Option<JsonValue>,
}

impl ActionRequest {
    /// Creates a request with empty params and HTML format.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            params: JsonValue::Object(Map::new()),
            headers: HashMap::new(),
            format: ResponseFormat::Html,
            current_user: None,
        }
    }

    /// Sets the parameters. Non-object values are replaced by `{}`.
    pub fn with_params(mut self, params: JsonValue) -> Self {
        self.params = match params {
            JsonValue::Object(_) => params,
            _ => JsonValue::Object(Map::new()),
        };
        self
    }

    /// Sets request headers.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a single header.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the negotiated format.
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the current user.
    pub fn with_current_user(mut self, user: JsonValue) -> Self {
        self.current_user = Some(user);
        self
    }

    /// Reads a top-level parameter.
    pub fn param(&self, key: &str) -> Option<&JsonValue> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True when the request carries the given frame header.
    pub fn is_turbo_frame_request(&self, frame_header: &str) -> bool {
        self.header(frame_header).is_some_and(|v| !v.is_empty())
    }
}

impl Default for ActionRequest {
    fn default() -> Self {
        Self::new("GET", "/")
    }
}
