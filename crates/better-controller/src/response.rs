// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Platform-agnostic response produced by controller actions.
//!
//! Host adapters convert a [`ControllerResponse`] into their own response
//! type. Template rendering stays with the host: [`ControllerResponse::Template`]
//! names the template and carries its locals.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::request::ResponseFormat;

/// Whether the host should wrap rendered HTML in its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// No layout option set; the host applies its usual rules.
    #[default]
    Default,
    /// Render without any layout.
    Disabled,
}

/// Flash messages attached to a redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Informational message.
    pub notice: Option<String>,
    /// Error message.
    pub alert: Option<String>,
}

impl Flash {
    /// A flash with a notice.
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            notice: Some(message.into()),
            alert: None,
        }
    }

    /// A flash with an alert.
    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            notice: None,
            alert: Some(message.into()),
        }
    }

    /// True when neither message is set.
    pub fn is_empty(&self) -> bool {
        self.notice.is_none() && self.alert.is_none()
    }
}

/// A response produced by a controller action.
///
/// # Example
///
/// ```rust
/// use better_controller::ControllerResponse;
///
/// let json = ControllerResponse::json(200, serde_json::json!({ "data": [] }));
/// assert!(json.is_success());
///
/// let redirect = ControllerResponse::redirect("/users");
/// assert!(redirect.is_redirect());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerResponse {
    /// HTML rendered by this crate (usually a component).
    Html {
        /// HTTP status code
        status: u16,
        /// HTTP headers
        headers: HashMap<String, String>,
        /// HTML body
        body: String,
        /// Layout handling
        layout: Layout,
    },

    /// A template the host must render.
    Template {
        /// HTTP status code
        status: u16,
        /// HTTP headers
        headers: HashMap<String, String>,
        /// Template name, `controller/action` by convention
        template: String,
        /// Format of the template to pick
        format: ResponseFormat,
        /// Template locals
        locals: JsonValue,
        /// Layout handling
        layout: Layout,
    },

    /// JSON response.
    Json {
        /// HTTP status code
        status: u16,
        /// HTTP headers
        headers: HashMap<String, String>,
        /// JSON body
        body: JsonValue,
    },

    /// Turbo Stream response.
    TurboStream {
        /// HTTP status code
        status: u16,
        /// HTTP headers
        headers: HashMap<String, String>,
        /// Concatenated `<turbo-stream>` elements
        body: String,
    },

    /// Raw data (CSV, XML, downloads).
    Data {
        /// HTTP status code
        status: u16,
        /// HTTP headers
        headers: HashMap<String, String>,
        /// MIME type
        content_type: String,
        /// Attachment filename, if this is a download
        filename: Option<String>,
        /// Body
        body: String,
    },

    /// Redirect response.
    Redirect {
        /// HTTP status code (301, 302, 303, 307, 308)
        status: u16,
        /// Redirect location
        location: String,
        /// Flash messages for the next request
        flash: Flash,
    },

    /// Status only, no body.
    Empty {
        /// HTTP status code
        status: u16,
    },
}

impl ControllerResponse {
    /// Creates an HTML response using the default layout.
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self::Html {
            status,
            headers: HashMap::new(),
            body: body.into(),
            layout: Layout::Default,
        }
    }

    /// Creates a template response for the host to render.
    pub fn template(status: u16, template: impl Into<String>, format: ResponseFormat, locals: JsonValue) -> Self {
        Self::Template {
            status,
            headers: HashMap::new(),
            template: template.into(),
            format,
            locals,
            layout: Layout::Default,
        }
    }

    /// Creates a JSON response.
    pub fn json(status: u16, body: JsonValue) -> Self {
        Self::Json {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Creates a Turbo Stream response.
    pub fn turbo_stream(status: u16, body: impl Into<String>) -> Self {
        Self::TurboStream {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Creates a data response.
    pub fn data(status: u16, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Data {
            status,
            headers: HashMap::new(),
            content_type: content_type.into(),
            filename: None,
            body: body.into(),
        }
    }

    /// Creates a redirect response (HTTP 302 by default).
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            status: 302,
            location: location.into(),
            flash: Flash::default(),
        }
    }

    /// Creates a redirect response with flash messages and a status.
    pub fn redirect_with(status: u16, location: impl Into<String>, flash: Flash) -> Self {
        Self::Redirect {
            status,
            location: location.into(),
            flash,
        }
    }

    /// Creates a status-only response.
    pub fn empty(status: u16) -> Self {
        Self::Empty { status }
    }

    /// Returns the status code.
    pub fn status(&self) -> u16 {
        match self {
            Self::Html { status, .. }
            | Self::Template { status, .. }
            | Self::Json { status, .. }
            | Self::TurboStream { status, .. }
            | Self::Data { status, .. }
            | Self::Redirect { status, .. }
            | Self::Empty { status } => *status,
        }
    }

    /// Overrides the status code.
    pub fn with_status(mut self, new_status: u16) -> Self {
        match &mut self {
            Self::Html { status, .. }
            | Self::Template { status, .. }
            | Self::Json { status, .. }
            | Self::TurboStream { status, .. }
            | Self::Data { status, .. }
            | Self::Redirect { status, .. }
            | Self::Empty { status } => *status = new_status,
        }
        self
    }

    /// Sets the layout option on `Html` and `Template` responses.
    pub fn with_layout(mut self, new_layout: Layout) -> Self {
        if let Self::Html { layout, .. } | Self::Template { layout, .. } = &mut self {
            *layout = new_layout;
        }
        self
    }

    /// Adds a header (ignored for `Redirect` and `Empty`).
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            Self::Html { headers, .. }
            | Self::Template { headers, .. }
            | Self::Json { headers, .. }
            | Self::TurboStream { headers, .. }
            | Self::Data { headers, .. } => {
                headers.insert(key.into(), value.into());
            }
            Self::Redirect { .. } | Self::Empty { .. } => {}
        }
        self
    }

    /// Returns true if this is a success response (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Returns true if this is a redirect response (3xx).
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status())
    }

    /// Returns true if this is an error response (4xx or 5xx).
    pub fn is_error(&self) -> bool {
        self.status() >= 400
    }

    /// The JSON body of a `Json` response.
    pub fn json_body(&self) -> Option<&JsonValue> {
        match self {
            Self::Json { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl Default for ControllerResponse {
    fn default() -> Self {
        Self::empty(204)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_response() {
        let resp = ControllerResponse::html(200, "<h1>Hello</h1>");
        assert_eq!(resp.status(), 200);
        assert!(resp.is_success());

        if let ControllerResponse::Html { body, layout, .. } = resp {
            assert_eq!(body, "<h1>Hello</h1>");
            assert_eq!(layout, Layout::Default);
        } else {
            panic!("Expected Html variant");
        }
    }

    #[test]
    fn test_redirect() {
        let resp = ControllerResponse::redirect_with(303, "/login", Flash::alert("Please sign in"));
        assert_eq!(resp.status(), 303);
        assert!(resp.is_redirect());

        if let ControllerResponse::Redirect { location, flash, .. } = resp {
            assert_eq!(location, "/login");
            assert_eq!(flash.alert.as_deref(), Some("Please sign in"));
        } else {
            panic!("Expected Redirect variant");
        }
    }

    #[test]
    fn test_with_status_and_layout() {
        let resp = ControllerResponse::template(200, "users/new", ResponseFormat::Html, JsonValue::Null)
            .with_status(422)
            .with_layout(Layout::Disabled);
        assert!(resp.is_error());
        if let ControllerResponse::Template { layout, .. } = resp {
            assert_eq!(layout, Layout::Disabled);
        } else {
            panic!("Expected Template variant");
        }
    }

    #[test]
    fn test_with_header() {
        let resp = ControllerResponse::json(200, serde_json::json!({})).with_header("X-Custom", "value");
        if let ControllerResponse::Json { headers, .. } = resp {
            assert_eq!(headers.get("X-Custom"), Some(&"value".to_string()));
        } else {
            panic!("Expected Json variant");
        }
    }

    #[test]
    fn test_default_is_no_content() {
        assert_eq!(ControllerResponse::default().status(), 204);
    }
}
