// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Conversion between axum requests/responses and controller values.
//!
//! This is a thin adapter: HTTP requests become [`ActionRequest`]s, and
//! [`ControllerResponse`]s become HTTP responses.

use std::collections::HashMap;

use axum::{
    body::Body,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use better_controller::turbo::escape_html;
use better_controller::{ActionRequest, ControllerResponse, Layout, ResponseFormat};
use serde_json::{Map, Value as JsonValue};

use super::body_parser::{parse_body, parse_query, BodyParseError};

/// Document shell wrapped around HTML rendered with the default layout.
const DEFAULT_APP_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>%title%</title>
</head>
<body>
<div id="flash">%flash%</div>
%body%
</body>
</html>"#;

/// Builds an [`ActionRequest`] from HTTP request parts.
///
/// Parameters are merged in this order, later sources winning: query
/// string, body, path parameters. The format comes from a `.ext` suffix
/// on the path, then `?format=`, then `Accept`; HTML requests carrying the
/// frame header become Turbo Frame requests.
pub fn to_action_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
    path_params: HashMap<String, String>,
    frame_header: &str,
) -> Result<ActionRequest, BodyParseError> {
    let headers_map: HashMap<String, String> = headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect();

    let (path, extension) = split_extension(uri.path());

    let mut params = parse_query(uri.query())?;
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if let JsonValue::Object(body_params) = parse_body(content_type, body)? {
        params.extend(body_params);
    }
    for (key, value) in path_params {
        let value = match &extension {
            Some(ext) => value
                .strip_suffix(&format!(".{}", ext))
                .map(str::to_string)
                .unwrap_or(value),
            None => value,
        };
        params.insert(key, JsonValue::String(value));
    }

    let format_param = extension
        .clone()
        .or_else(|| params.get("format").and_then(JsonValue::as_str).map(str::to_string));
    let frame_request = headers_map
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case(frame_header) && !v.is_empty());
    let accept = headers.get("accept").and_then(|v| v.to_str().ok());
    let format = ResponseFormat::negotiate(format_param.as_deref(), accept, frame_request);

    Ok(ActionRequest::new(method.as_str(), &path)
        .with_params(JsonValue::Object(normalize_ids(params)))
        .with_headers(headers_map)
        .with_format(format))
}

/// Splits a known format extension off the last path segment.
fn split_extension(path: &str) -> (String, Option<String>) {
    let last = path.rsplit('/').next().unwrap_or("");
    if let Some((stem, ext)) = last.rsplit_once('.') {
        if !stem.is_empty() && ResponseFormat::from_extension(ext).is_some() {
            let trimmed = &path[..path.len() - ext.len() - 1];
            return (trimmed.to_string(), Some(ext.to_ascii_lowercase()));
        }
    }
    (path.to_string(), None)
}

/// Numeric `id` strings become numbers so services can compare them.
fn normalize_ids(mut params: Map<String, JsonValue>) -> Map<String, JsonValue> {
    if let Some(JsonValue::String(id)) = params.get("id") {
        if let Ok(n) = id.parse::<u64>() {
            params.insert("id".to_string(), JsonValue::from(n));
        }
    }
    params
}

/// Converts a [`ControllerResponse`] into an axum response.
///
/// `Template` responses are rendered by the caller when it has views; this
/// fallback shows the template name and its locals.
pub fn into_axum_response(response: ControllerResponse) -> Response {
    match response {
        ControllerResponse::Html {
            status,
            headers,
            body,
            layout,
        } => {
            let html = match layout {
                Layout::Default => wrap_with_app_html(&body, "BetterController", ""),
                Layout::Disabled => body,
            };
            build(status, headers, ResponseFormat::Html.content_type(), Body::from(html))
        }
        ControllerResponse::Template {
            status,
            headers,
            template,
            locals,
            layout,
            ..
        } => {
            let body = format!(
                "<section data-template=\"{}\"><pre>{}</pre></section>",
                escape_html(&template),
                escape_html(&serde_json::to_string_pretty(&locals).unwrap_or_default())
            );
            let html = match layout {
                Layout::Default => wrap_with_app_html(&body, &template, ""),
                Layout::Disabled => body,
            };
            build(status, headers, ResponseFormat::Html.content_type(), Body::from(html))
        }
        ControllerResponse::Json { status, headers, body } => build(
            status,
            headers,
            ResponseFormat::Json.content_type(),
            Body::from(serde_json::to_string(&body).unwrap_or_default()),
        ),
        ControllerResponse::TurboStream { status, headers, body } => build(
            status,
            headers,
            ResponseFormat::TurboStream.content_type(),
            Body::from(body),
        ),
        ControllerResponse::Data {
            status,
            mut headers,
            content_type,
            filename,
            body,
        } => {
            if let Some(filename) = filename {
                headers.insert(
                    "content-disposition".to_string(),
                    format!("attachment; filename=\"{}\"", filename.replace('"', "")),
                );
            }
            build(status, headers, &content_type, Body::from(body))
        }
        ControllerResponse::Redirect { status, location, flash } => {
            let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::FOUND);
            let mut builder = Response::builder().status(status_code).header("location", location);
            if let Some(notice) = flash.notice {
                builder = builder.header("x-flash-notice", notice);
            }
            if let Some(alert) = flash.alert {
                builder = builder.header("x-flash-alert", alert);
            }
            builder
                .body(Body::empty())
                .unwrap_or_else(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response").into_response())
        }
        ControllerResponse::Empty { status } => {
            StatusCode::from_u16(status).unwrap_or(StatusCode::NO_CONTENT).into_response()
        }
    }
}

fn build(status: u16, headers: HashMap<String, String>, content_type: &str, body: Body) -> Response {
    let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
    let mut builder = Response::builder().status(status_code);

    for (key, value) in headers {
        builder = builder.header(key, value);
    }
    builder = builder.header("content-type", content_type);

    builder
        .body(body)
        .unwrap_or_else(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response").into_response())
}

/// Wraps a body with the document shell.
pub fn wrap_with_app_html(body: &str, title: &str, flash: &str) -> String {
    DEFAULT_APP_HTML
        .replace("%title%", &escape_html(title))
        .replace("%flash%", flash)
        .replace("%body%", body)
}

/// Plain error page for failures outside any action.
pub fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!("<h1>Error</h1>\n<div class=\"error\"><pre>{}</pre></div>", escape_html(message));
    (status, Html(wrap_with_app_html(&body, "Error", ""))).into_response()
}
