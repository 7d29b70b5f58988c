// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Context passed to handler blocks.

use serde_json::{Map, Value as JsonValue};

use crate::config::Configuration;
use crate::csv_export::{self, CsvOptions};
use crate::envelope::{self, ErrorPayload};
use crate::error::{ActionError, ErrorKind};
use crate::request::ActionRequest;
use crate::response::{ControllerResponse, Flash};
use crate::result::{ExecutionResult, PageConfig};
use crate::turbo::{ContentResolver, TurboStreamBuilder};

/// What a handler block sees.
///
/// On failure, `error` holds the error that aborted the action (if one was
/// raised) and `error_kind` its classification. `status` is the status the
/// built-in handler would have used.
///
/// # Example
///
/// ```rust,ignore
/// f.json_with(|ctx| {
///     Ok(ctx.respond_with_success(serde_json::json!({ "id": ctx.resource()["id"] }), None))
/// });
/// ```
pub struct HandlerContext<'a> {
    /// Action name.
    pub action: &'a str,
    /// Controller name.
    pub controller: &'a str,
    /// The request.
    pub request: &'a ActionRequest,
    /// The normalized result.
    pub result: &'a ExecutionResult,
    /// The resolved page config.
    pub page_config: Option<&'a PageConfig>,
    /// The error that aborted the action, if any.
    pub error: Option<&'a ActionError>,
    /// Failure classification; `None` on success.
    pub error_kind: Option<ErrorKind>,
    /// Default status for this outcome.
    pub status: u16,
    pub(crate) settings: &'a Configuration,
    pub(crate) content: &'a dyn ContentResolver,
}

impl<'a> HandlerContext<'a> {
    /// The result's resource, or `null`.
    pub fn resource(&self) -> &JsonValue {
        self.result.resource().unwrap_or(&JsonValue::Null)
    }

    /// API version of the envelope.
    pub fn api_version(&self) -> &str {
        &self.settings.api_version
    }

    /// A success envelope with this context's status.
    pub fn respond_with_success(&self, data: JsonValue, meta: Option<&JsonValue>) -> ControllerResponse {
        envelope::respond_with_success(data, self.status, meta, &self.settings.api_version)
    }

    /// An error envelope with this context's status.
    pub fn respond_with_error(&self, payload: &ErrorPayload<'_>) -> ControllerResponse {
        envelope::respond_with_error(payload, self.status, None, &self.settings.api_version)
    }

    /// Redirects with flash messages.
    pub fn redirect(&self, location: impl Into<String>, flash: Flash) -> ControllerResponse {
        ControllerResponse::redirect_with(302, location, flash)
    }

    /// Renders a registered component with the result's locals injected.
    pub fn render_component(&self, name: &str, locals: &Map<String, JsonValue>) -> Result<ControllerResponse, ActionError> {
        let body = self.content.render_component(name, locals)?;
        Ok(ControllerResponse::html(self.status, body))
    }

    /// Renders a Turbo Stream response.
    pub fn render_stream(&self, builder: &TurboStreamBuilder) -> Result<ControllerResponse, ActionError> {
        Ok(ControllerResponse::turbo_stream(self.status, builder.render(self.content)?))
    }

    /// Sends a CSV download.
    pub fn send_csv(&self, collection: &[JsonValue], options: &CsvOptions) -> Result<ControllerResponse, ActionError> {
        csv_export::send_csv(collection, options).map_err(|e| ActionError::message(e.to_string()))
    }
}
