// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Mounting controller actions on an axum [`Router`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::Path,
    http::{Request, StatusCode},
    response::Response,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use better_controller::turbo::escape_html;
use better_controller::{ActionRequest, BetterControllerError, Controller, ControllerResponse, TemplateRenderer};
use serde_json::Value as JsonValue;

use super::body_parser::{BodyParseError, MAX_BODY_SIZE};
use super::http::{error_page, into_axum_response, to_action_request};

/// Resolves the current user from an incoming request.
pub type CurrentUserResolver = Arc<dyn Fn(&ActionRequest) -> Option<JsonValue> + Send + Sync>;

struct RouteEntry {
    method: MethodFilter,
    path: String,
    action: String,
}

struct RouteState {
    controller: Arc<Controller>,
    views: Option<Arc<dyn TemplateRenderer>>,
    current_user: Option<CurrentUserResolver>,
}

/// Maps HTTP routes to the actions of one controller.
///
/// # Example
///
/// ```rust
/// use better_controller::{ActionRegistry, Controller};
/// use better_controller_server::server::ActionRoutes;
///
/// let mut registry = ActionRegistry::new();
/// registry.define("index", |_| {});
/// let controller = Controller::new("articles", registry);
///
/// let router: axum::Router = ActionRoutes::new(controller)
///     .get("/articles", "index")
///     .into_router();
/// ```
pub struct ActionRoutes {
    controller: Arc<Controller>,
    routes: Vec<RouteEntry>,
    views: Option<Arc<dyn TemplateRenderer>>,
    current_user: Option<CurrentUserResolver>,
}

impl fmt::Debug for ActionRoutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRoutes")
            .field("controller", &self.controller.name())
            .field("routes", &self.routes.iter().map(|r| (&r.path, &r.action)).collect::<Vec<_>>())
            .finish()
    }
}

impl ActionRoutes {
    /// Starts an empty route table for `controller`.
    pub fn new(controller: Controller) -> Self {
        Self {
            controller: Arc::new(controller),
            routes: Vec::new(),
            views: None,
            current_user: None,
        }
    }

    /// Adds a route for any method filter.
    pub fn route(mut self, method: MethodFilter, path: &str, action: &str) -> Self {
        self.routes.push(RouteEntry {
            method,
            path: path.to_string(),
            action: action.to_string(),
        });
        self
    }

    /// `GET path` → `action`
    pub fn get(self, path: &str, action: &str) -> Self {
        self.route(MethodFilter::GET, path, action)
    }

    /// `POST path` → `action`
    pub fn post(self, path: &str, action: &str) -> Self {
        self.route(MethodFilter::POST, path, action)
    }

    /// `PUT path` → `action`
    pub fn put(self, path: &str, action: &str) -> Self {
        self.route(MethodFilter::PUT, path, action)
    }

    /// `PATCH path` → `action`
    pub fn patch(self, path: &str, action: &str) -> Self {
        self.route(MethodFilter::PATCH, path, action)
    }

    /// `DELETE path` → `action`
    pub fn delete(self, path: &str, action: &str) -> Self {
        self.route(MethodFilter::DELETE, path, action)
    }

    /// Renders `Template` responses with these views.
    pub fn with_views(mut self, views: impl TemplateRenderer + 'static) -> Self {
        self.views = Some(Arc::new(views));
        self
    }

    /// Resolves the current user for every request.
    pub fn with_current_user<F>(mut self, resolve: F) -> Self
    where
        F: Fn(&ActionRequest) -> Option<JsonValue> + Send + Sync + 'static,
    {
        self.current_user = Some(Arc::new(resolve));
        self
    }

    /// Registered `(path, action)` pairs, in declaration order.
    pub fn describe(&self) -> Vec<(String, String)> {
        self.routes
            .iter()
            .map(|r| (r.path.clone(), r.action.clone()))
            .collect()
    }

    /// Builds the router. Routes sharing a path share one method router.
    pub fn into_router(self) -> Router {
        let state = Arc::new(RouteState {
            controller: self.controller,
            views: self.views,
            current_user: self.current_user,
        });

        let mut by_path: Vec<(String, MethodRouter)> = Vec::new();
        for entry in self.routes {
            let handler = {
                let state = state.clone();
                let action = entry.action.clone();
                move |path: Option<Path<HashMap<String, String>>>, request: Request<Body>| {
                    let state = state.clone();
                    let action = action.clone();
                    async move {
                        let params = path.map(|Path(p)| p).unwrap_or_default();
                        handle_action(&state, &action, params, request).await
                    }
                }
            };

            match by_path.iter().position(|(p, _)| *p == entry.path) {
                Some(index) => {
                    let (path, existing) = by_path.remove(index);
                    by_path.insert(index, (path, existing.on(entry.method, handler)));
                }
                None => by_path.push((entry.path, on(entry.method, handler))),
            }
        }

        by_path
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| router.route(&path, method_router))
    }
}

async fn handle_action(
    state: &RouteState,
    action: &str,
    path_params: HashMap<String, String>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(_) => return error_page(StatusCode::PAYLOAD_TOO_LARGE, &BodyParseError::TooLarge.to_string()),
    };

    let settings = state.controller.settings();
    let mut action_request = match to_action_request(
        &parts.method,
        &parts.uri,
        &parts.headers,
        &bytes,
        path_params,
        &settings.frame_header,
    ) {
        Ok(request) => request,
        Err(e) => return error_page(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    if let Some(resolve) = &state.current_user {
        if let Some(user) = resolve(&action_request) {
            action_request = action_request.with_current_user(user);
        }
    }

    tracing::info!(
        controller = state.controller.name(),
        action,
        method = %action_request.method,
        path = %action_request.path,
        format = %action_request.format,
        "dispatching"
    );

    match state.controller.execute(action, &action_request) {
        Ok(response) => into_axum_response(render_views(state.views.as_deref(), response)),
        Err(BetterControllerError::ActionNotRegistered(name)) => {
            error_page(StatusCode::NOT_FOUND, &format!("Unknown action: {}", name))
        }
        Err(e) => {
            tracing::error!("Action {} failed: {}", action, e);
            error_page(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Renders a `Template` response through the views when present.
fn render_views(views: Option<&dyn TemplateRenderer>, response: ControllerResponse) -> ControllerResponse {
    let Some(views) = views else {
        return response;
    };
    match response {
        ControllerResponse::Template {
            status,
            headers,
            template,
            locals,
            layout,
            ..
        } => match views.render_partial(&template, &locals) {
            Ok(body) => ControllerResponse::Html {
                status,
                headers,
                body,
                layout,
            },
            Err(e) => {
                tracing::error!("Template {} failed: {}", template, e);
                ControllerResponse::html(500, format!("<pre>Template error: {}</pre>", escape_html(&e.to_string())))
            }
        },
        other => other,
    }
}
