// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Action configuration records and handler descriptors.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::HandlerContext;
use crate::error::{ActionError, ErrorKind};
use crate::page::{ComponentSource, Page};
use crate::params::PermitSpec;
use crate::request::{ActionRequest, ResponseFormat};
use crate::response::{ControllerResponse, Flash};
use crate::result::{ExecutionResult, PageConfig};
use crate::service::SharedService;
use crate::turbo::{StreamOperation, TurboStreamBuilder};

/// Runs before the service. Returning an error aborts the action.
pub type BeforeCallback = Arc<dyn Fn(&ActionRequest) -> Result<(), ActionError> + Send + Sync>;

/// Runs after the service with the (mutable) result.
pub type AfterCallback = Arc<dyn Fn(&ActionRequest, &mut ExecutionResult) -> Result<(), ActionError> + Send + Sync>;

/// Adjusts the resolved page config for one request.
pub type PageConfigModifier = Arc<dyn Fn(&mut PageConfig, &ActionRequest) + Send + Sync>;

/// A handler written as a closure.
pub type HandlerBlock = Arc<dyn Fn(&HandlerContext<'_>) -> Result<ControllerResponse, ActionError> + Send + Sync>;

/// Authentication / authorization check installed on a controller.
pub type Guard = Arc<dyn Fn(&ActionRequest) -> Result<(), ActionError> + Send + Sync>;

lazy_static! {
    static ref PATH_SEGMENT: Regex = Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("valid path segment regex");
}

/// Where a redirect goes.
#[derive(Clone)]
pub enum RedirectPath {
    /// A fixed path. `:field` segments are filled from the result's resource
    /// (`/users/:id` → `/users/7`).
    Static(String),
    /// A path computed from the result.
    Dynamic(Arc<dyn Fn(&ExecutionResult) -> String + Send + Sync>),
}

impl RedirectPath {
    /// Resolves the final location.
    pub fn resolve(&self, result: &ExecutionResult) -> String {
        match self {
            Self::Static(path) => interpolate(path, result.resource()),
            Self::Dynamic(f) => f(result),
        }
    }
}

impl fmt::Debug for RedirectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(path) => f.debug_tuple("Static").field(path).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

fn interpolate(path: &str, resource: Option<&JsonValue>) -> String {
    let Some(resource) = resource else {
        return path.to_string();
    };
    PATH_SEGMENT
        .replace_all(path, |caps: &regex::Captures<'_>| match resource.get(&caps[1]) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Null) | None => caps[0].to_string(),
            Some(other) => other.to_string(),
        })
        .into_owned()
}

/// Options of a redirect handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectOptions {
    /// Flash notice.
    pub notice: Option<String>,
    /// Flash alert.
    pub alert: Option<String>,
    /// Redirect status (default 302).
    pub status: Option<u16>,
}

impl RedirectOptions {
    pub(crate) fn flash(&self) -> Flash {
        Flash {
            notice: self.notice.clone(),
            alert: self.alert.clone(),
        }
    }
}

/// How one format of a success or failure is answered.
#[derive(Clone)]
pub enum HandlerDescriptor {
    /// Redirect, optionally with flash messages.
    Redirect {
        /// Target.
        path: RedirectPath,
        /// Flash and status.
        options: RedirectOptions,
    },
    /// Render the action's page (component or template).
    RenderPage {
        /// Status override.
        status: Option<u16>,
    },
    /// Render a registered component.
    RenderComponent {
        /// Registered component name.
        component: String,
        /// Locals overriding the injected ones.
        locals: Map<String, JsonValue>,
        /// Status override.
        status: Option<u16>,
    },
    /// Run a closure.
    Block(HandlerBlock),
    /// Render a list of Turbo Stream operations.
    TurboStreamList(Vec<StreamOperation>),
}

impl HandlerDescriptor {
    /// Redirect to a static path.
    pub fn redirect_to(path: impl Into<String>) -> Self {
        Self::Redirect {
            path: RedirectPath::Static(path.into()),
            options: RedirectOptions::default(),
        }
    }

    /// Redirect to a path computed from the result.
    pub fn redirect_with<F>(f: F) -> Self
    where
        F: Fn(&ExecutionResult) -> String + Send + Sync + 'static,
    {
        Self::Redirect {
            path: RedirectPath::Dynamic(Arc::new(f)),
            options: RedirectOptions::default(),
        }
    }

    /// Render the page.
    pub fn render_page() -> Self {
        Self::RenderPage { status: None }
    }

    /// Render a component.
    pub fn render_component(component: impl Into<String>) -> Self {
        Self::RenderComponent {
            component: component.into(),
            locals: Map::new(),
            status: None,
        }
    }

    /// Run a closure.
    pub fn block<F>(f: F) -> Self
    where
        F: Fn(&HandlerContext<'_>) -> Result<ControllerResponse, ActionError> + Send + Sync + 'static,
    {
        Self::Block(Arc::new(f))
    }

    /// Render Turbo Stream operations.
    pub fn stream(builder: TurboStreamBuilder) -> Self {
        Self::TurboStreamList(builder.into_operations())
    }

    /// Sets the flash notice of a redirect.
    pub fn with_notice(mut self, message: impl Into<String>) -> Self {
        if let Self::Redirect { options, .. } = &mut self {
            options.notice = Some(message.into());
        }
        self
    }

    /// Sets the flash alert of a redirect.
    pub fn with_alert(mut self, message: impl Into<String>) -> Self {
        if let Self::Redirect { options, .. } = &mut self {
            options.alert = Some(message.into());
        }
        self
    }

    /// Sets the status of a redirect or render.
    pub fn with_status(mut self, new_status: u16) -> Self {
        match &mut self {
            Self::Redirect { options, .. } => options.status = Some(new_status),
            Self::RenderPage { status } | Self::RenderComponent { status, .. } => *status = Some(new_status),
            Self::Block(_) | Self::TurboStreamList(_) => {}
        }
        self
    }

    /// Adds a local to a component render.
    pub fn with_local(mut self, key: &str, value: JsonValue) -> Self {
        if let Self::RenderComponent { locals, .. } = &mut self {
            locals.insert(key.to_string(), value);
        }
        self
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redirect { path, options } => f
                .debug_struct("Redirect")
                .field("path", path)
                .field("options", options)
                .finish(),
            Self::RenderPage { status } => f.debug_struct("RenderPage").field("status", status).finish(),
            Self::RenderComponent {
                component,
                locals,
                status,
            } => f
                .debug_struct("RenderComponent")
                .field("component", component)
                .field("locals", locals)
                .field("status", status)
                .finish(),
            Self::Block(_) => f.write_str("Block(..)"),
            Self::TurboStreamList(ops) => f.debug_tuple("TurboStreamList").field(ops).finish(),
        }
    }
}

/// Handlers keyed by response format.
#[derive(Debug, Clone, Default)]
pub struct FormatHandlers {
    handlers: HashMap<ResponseFormat, HandlerDescriptor>,
}

impl FormatHandlers {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler for a format.
    pub fn insert(&mut self, format: ResponseFormat, handler: HandlerDescriptor) {
        self.handlers.insert(format, handler);
    }

    /// The handler for a format.
    pub fn get(&self, format: ResponseFormat) -> Option<&HandlerDescriptor> {
        self.handlers.get(&format)
    }

    /// The handler answering a request in `format`. A frame request without
    /// its own handler is answered by the `html` handler.
    pub fn resolve(&self, format: ResponseFormat) -> Option<&HandlerDescriptor> {
        self.get(format).or_else(|| match format {
            ResponseFormat::TurboFrame => self.get(ResponseFormat::Html),
            _ => None,
        })
    }

    /// True when no handler is set.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Number of formats handled.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

/// Everything declared for one action.
#[derive(Clone, Default)]
pub struct ActionConfiguration {
    /// Action name.
    pub name: String,
    /// Service to call; `None` goes straight to rendering.
    pub service: Option<SharedService>,
    /// Parameter root key (`user` for `params[:user]`).
    pub params_key: Option<String>,
    /// Permit list, in declaration order.
    pub permitted: Vec<PermitSpec>,
    /// Page building the page config.
    pub page: Option<Arc<dyn Page>>,
    /// Explicit component to render.
    pub component: Option<ComponentSource>,
    /// Callbacks before the service, in order.
    pub before: Vec<BeforeCallback>,
    /// Callbacks after the service, in order.
    pub after: Vec<AfterCallback>,
    /// Per-request page config adjustment.
    pub page_config_modifier: Option<PageConfigModifier>,
    /// Success handlers.
    pub on_success: FormatHandlers,
    /// Failure handlers per classification.
    pub on_error: HashMap<ErrorKind, FormatHandlers>,
    /// Skip the controller's authentication guard.
    pub skip_authentication: bool,
    /// Skip the controller's authorization guard.
    pub skip_authorization: bool,
}

impl ActionConfiguration {
    /// Creates an empty configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The explicit success handler for a format. A frame request without
    /// its own handler uses the `html` one.
    pub fn success_handler(&self, format: ResponseFormat) -> Option<&HandlerDescriptor> {
        self.on_success.resolve(format)
    }

    /// The failure handlers for a classification, falling back to the `Any`
    /// handlers, then to an empty mapping.
    pub fn error_handlers(&self, kind: ErrorKind) -> FormatHandlers {
        self.on_error
            .get(&kind)
            .or_else(|| self.on_error.get(&ErrorKind::Any))
            .cloned()
            .unwrap_or_default()
    }

    /// The failure handler for `(kind, format)`, falling back to `(Any, format)`.
    pub fn error_handler(&self, kind: ErrorKind, format: ResponseFormat) -> Option<&HandlerDescriptor> {
        self.on_error
            .get(&kind)
            .and_then(|h| h.resolve(format))
            .or_else(|| self.on_error.get(&ErrorKind::Any).and_then(|h| h.resolve(format)))
    }

    /// True when rendering a page can produce something besides a bare status.
    pub fn has_page_source(&self) -> bool {
        self.page.is_some() || self.component.is_some()
    }
}

impl fmt::Debug for ActionConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionConfiguration")
            .field("name", &self.name)
            .field("service", &self.service.is_some())
            .field("params_key", &self.params_key)
            .field("permitted", &self.permitted)
            .field("page", &self.page.is_some())
            .field("component", &self.component)
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("on_success", &self.on_success)
            .field("on_error", &self.on_error)
            .field("skip_authentication", &self.skip_authentication)
            .field("skip_authorization", &self.skip_authorization)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_static_path_interpolation() {
        let result = ExecutionResult::success().with_resource(json!({ "id": 7, "slug": "hello" }));
        assert_eq!(RedirectPath::Static("/users/:id".into()).resolve(&result), "/users/7");
        assert_eq!(RedirectPath::Static("/posts/:slug/edit".into()).resolve(&result), "/posts/hello/edit");
        // unknown segments stay as written
        assert_eq!(RedirectPath::Static("/a/:missing".into()).resolve(&result), "/a/:missing");
        assert_eq!(RedirectPath::Static("/users/:id".into()).resolve(&ExecutionResult::new()), "/users/:id");
    }

    #[test]
    fn test_dynamic_path() {
        let path = RedirectPath::Dynamic(Arc::new(|r: &ExecutionResult| {
            format!("/orders/{}", r.resource().map(|v| v["id"].to_string()).unwrap_or_default())
        }));
        let result = ExecutionResult::success().with_resource(json!({ "id": 3 }));
        assert_eq!(path.resolve(&result), "/orders/3");
    }

    #[test]
    fn test_descriptor_options() {
        let handler = HandlerDescriptor::redirect_to("/users").with_notice("Saved").with_status(303);
        match handler {
            HandlerDescriptor::Redirect { options, .. } => {
                assert_eq!(options.notice.as_deref(), Some("Saved"));
                assert_eq!(options.status, Some(303));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_handlers_fall_back_to_any() {
        let mut config = ActionConfiguration::new("create");
        let mut any = FormatHandlers::new();
        any.insert(ResponseFormat::Json, HandlerDescriptor::render_page());
        config.on_error.insert(ErrorKind::Any, any);

        let handlers = config.error_handlers(ErrorKind::Validation);
        assert!(matches!(handlers.get(ResponseFormat::Json), Some(HandlerDescriptor::RenderPage { .. })));
        assert!(config.error_handler(ErrorKind::Validation, ResponseFormat::Json).is_some());
        assert!(config.error_handler(ErrorKind::Validation, ResponseFormat::Html).is_none());
    }

    #[test]
    fn test_error_handlers_empty_without_entries() {
        let config = ActionConfiguration::new("create");
        assert!(config.error_handlers(ErrorKind::NotFound).is_empty());
        assert!(config.error_handler(ErrorKind::NotFound, ResponseFormat::Html).is_none());
    }

    #[test]
    fn test_error_handler_prefers_specific_kind() {
        let mut config = ActionConfiguration::new("show");
        let mut not_found = FormatHandlers::new();
        not_found.insert(ResponseFormat::Html, HandlerDescriptor::redirect_to("/"));
        let mut any = FormatHandlers::new();
        any.insert(ResponseFormat::Html, HandlerDescriptor::render_page());
        config.on_error.insert(ErrorKind::NotFound, not_found);
        config.on_error.insert(ErrorKind::Any, any);

        assert!(matches!(
            config.error_handler(ErrorKind::NotFound, ResponseFormat::Html),
            Some(HandlerDescriptor::Redirect { .. })
        ));
        assert!(matches!(
            config.error_handler(ErrorKind::Authorization, ResponseFormat::Html),
            Some(HandlerDescriptor::RenderPage { .. })
        ));
    }

    #[test]
    fn test_frame_request_uses_html_handlers() {
        let mut config = ActionConfiguration::new("create");
        config.on_success.insert(ResponseFormat::Html, HandlerDescriptor::redirect_to("/users/:id"));
        let mut validation = FormatHandlers::new();
        validation.insert(ResponseFormat::Html, HandlerDescriptor::render_page());
        config.on_error.insert(ErrorKind::Validation, validation);
        let mut any = FormatHandlers::new();
        any.insert(ResponseFormat::Html, HandlerDescriptor::redirect_to("/"));
        config.on_error.insert(ErrorKind::Any, any);

        assert!(matches!(
            config.success_handler(ResponseFormat::TurboFrame),
            Some(HandlerDescriptor::Redirect { .. })
        ));
        assert!(matches!(
            config.error_handler(ErrorKind::Validation, ResponseFormat::TurboFrame),
            Some(HandlerDescriptor::RenderPage { .. })
        ));
        assert!(matches!(
            config.error_handler(ErrorKind::NotFound, ResponseFormat::TurboFrame),
            Some(HandlerDescriptor::Redirect { .. })
        ));
        assert!(config.success_handler(ResponseFormat::TurboStream).is_none());
    }

    #[test]
    fn test_frame_handler_wins_over_html() {
        let mut config = ActionConfiguration::new("update");
        config.on_success.insert(ResponseFormat::Html, HandlerDescriptor::redirect_to("/"));
        config.on_success.insert(ResponseFormat::TurboFrame, HandlerDescriptor::render_page());

        assert!(matches!(
            config.success_handler(ResponseFormat::TurboFrame),
            Some(HandlerDescriptor::RenderPage { .. })
        ));
    }
}
