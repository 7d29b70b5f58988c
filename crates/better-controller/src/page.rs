// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Pages, components and how an action picks what to render.
//!
//! Resolution order for HTML:
//!
//! 1. an explicit `component` directive on the action
//! 2. a page config whose `type` maps to a registered page component
//!    (`{namespace}::{UpperCamel(type)}::PageComponent`)
//! 3. the host's template for `controller/action`
//!
//! A name that is not registered is skipped, never an error.

use heck::ToUpperCamelCase;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ActionError;
use crate::request::ResponseFormat;
use crate::response::{ControllerResponse, Layout};
use crate::result::{ExecutionResult, PageConfig};

/// A renderable unit producing an HTML string from props.
pub trait Component: Send + Sync {
    /// Renders the component.
    fn render(&self, props: &JsonValue) -> Result<String, ActionError>;
}

impl<F> Component for F
where
    F: Fn(&JsonValue) -> Result<String, ActionError> + Send + Sync,
{
    fn render(&self, props: &JsonValue) -> Result<String, ActionError> {
        self(props)
    }
}

/// Host-side template rendering, used for Turbo Stream partials.
pub trait TemplateRenderer: Send + Sync {
    /// Renders a partial by name.
    fn render_partial(&self, name: &str, locals: &JsonValue) -> Result<String, ActionError>;
}

impl<F> TemplateRenderer for F
where
    F: Fn(&str, &JsonValue) -> Result<String, ActionError> + Send + Sync,
{
    fn render_partial(&self, name: &str, locals: &JsonValue) -> Result<String, ActionError> {
        self(name, locals)
    }
}

/// Inputs available when a page builds its configuration.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// The action being rendered; pages switch on it.
    pub action: &'a str,
    /// The normalized service result.
    pub result: &'a ExecutionResult,
    /// The current user, if any.
    pub current_user: Option<&'a JsonValue>,
}

/// Builds a [`PageConfig`] for an action.
pub trait Page: Send + Sync {
    /// Returns the page configuration for `ctx.action`.
    fn build(&self, ctx: &PageContext<'_>) -> Result<PageConfig, ActionError>;
}

impl<F> Page for F
where
    F: Fn(&PageContext<'_>) -> Result<PageConfig, ActionError> + Send + Sync,
{
    fn build(&self, ctx: &PageContext<'_>) -> Result<PageConfig, ActionError> {
        self(ctx)
    }
}

/// The `component` directive of an action: a registered name plus static locals.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSource {
    /// Registered component name.
    pub name: String,
    /// Locals passed on every render.
    pub locals: Map<String, JsonValue>,
}

/// Registered components by name.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.components.keys().collect();
        names.sort();
        f.debug_struct("ComponentRegistry").field("components", &names).finish()
    }
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component under a name, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, component: impl Component + 'static) -> &mut Self {
        self.components.insert(name.into(), Arc::new(component));
        self
    }

    /// Looks up a component.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components.get(name).cloned()
    }

    /// True when a component with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Renders a registered component.
    pub fn render(&self, name: &str, props: &JsonValue) -> Result<String, ActionError> {
        let component = self
            .components
            .get(name)
            .ok_or_else(|| ActionError::message(format!("component '{}' is not registered", name)))?;
        component.render(props)
    }

    /// Finds the page component for a page config's `type`.
    pub fn page_component(&self, namespace: &str, config: &PageConfig) -> Option<(String, Arc<dyn Component>)> {
        let name = page_component_name(namespace, config.page_type()?);
        let component = self.get(&name)?;
        Some((name, component))
    }
}

/// `{namespace}::{UpperCamel(type)}::PageComponent`
pub fn page_component_name(namespace: &str, page_type: &str) -> String {
    format!("{}::{}::PageComponent", namespace, page_type.to_upper_camel_case())
}

/// What the HTML default renderer settled on.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Render this registered component with these props.
    Component {
        /// Registered name.
        name: String,
        /// Props to render with.
        props: JsonValue,
    },
    /// Let the host render its template.
    Template,
}

/// Resolves what to render for an action.
pub fn resolve(
    registry: &ComponentRegistry,
    namespace: &str,
    component: Option<&ComponentSource>,
    page_config: Option<&PageConfig>,
    result: &ExecutionResult,
) -> Resolution {
    if let Some(source) = component {
        if registry.contains(&source.name) {
            return Resolution::Component {
                name: source.name.clone(),
                props: merge_locals(result, &source.locals, &Map::new()),
            };
        }
        tracing::debug!(component = %source.name, "component not registered, falling back");
    }

    if let Some(config) = page_config {
        if let Some((name, _)) = registry.page_component(namespace, config) {
            return Resolution::Component {
                name,
                props: config.to_value(),
            };
        }
    }

    Resolution::Template
}

/// The component to render for an in-frame request.
///
/// Only frame requests whose page config names a registered `klass` get one.
pub fn frame_component<'a>(
    registry: &ComponentRegistry,
    frame_request: bool,
    page_config: Option<&'a PageConfig>,
) -> Option<&'a str> {
    if !frame_request {
        return None;
    }
    page_config
        .and_then(PageConfig::klass)
        .filter(|klass| registry.contains(klass))
}

/// Inputs of the default HTML render.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    /// Namespace of page components.
    pub namespace: &'a str,
    /// Whether the request came from inside a Turbo Frame.
    pub frame_request: bool,
    /// The action's `component` directive.
    pub component: Option<&'a ComponentSource>,
    /// The resolved page config.
    pub page_config: Option<&'a PageConfig>,
    /// The normalized result.
    pub result: &'a ExecutionResult,
    /// Template used when no component applies (`controller/action`).
    pub template: String,
    /// Format of that template.
    pub format: ResponseFormat,
    /// Response status.
    pub status: u16,
}

/// The default HTML render.
///
/// | frame request | `klass` registered | outcome                           |
/// |---------------|--------------------|-----------------------------------|
/// | yes           | yes                | `klass` component, layout off     |
/// | yes           | no                 | standard render                   |
/// | no            | yes                | standard render, `klass` ignored  |
/// | no            | no                 | standard render                   |
///
/// The standard render follows [`resolve`].
pub fn render_html_default(registry: &ComponentRegistry, req: &RenderRequest<'_>) -> Result<ControllerResponse, ActionError> {
    if let Some(klass) = frame_component(registry, req.frame_request, req.page_config) {
        let props = req.page_config.map(PageConfig::to_value).unwrap_or_default();
        let body = registry.render(klass, &props)?;
        tracing::debug!(component = %klass, "rendering frame component without layout");
        return Ok(ControllerResponse::html(req.status, body).with_layout(Layout::Disabled));
    }

    match resolve(registry, req.namespace, req.component, req.page_config, req.result) {
        Resolution::Component { name, props } => {
            let body = registry.render(&name, &props)?;
            Ok(ControllerResponse::html(req.status, body))
        }
        Resolution::Template => {
            let mut locals = merge_locals(req.result, &Map::new(), &Map::new());
            if let (Some(config), JsonValue::Object(map)) = (req.page_config, &mut locals) {
                map.insert("page_config".to_string(), config.to_value());
            }
            Ok(ControllerResponse::template(req.status, req.template.clone(), req.format, locals))
        }
    }
}

/// Builds component props.
///
/// `result`, `resource` and `collection` are injected from the result first,
/// then `base` locals, then `explicit` locals, each overriding the previous.
pub fn merge_locals(
    result: &ExecutionResult,
    base: &Map<String, JsonValue>,
    explicit: &Map<String, JsonValue>,
) -> JsonValue {
    let mut props = Map::new();
    props.insert("result".to_string(), result.clone().into_value());
    if let Some(resource) = result.resource() {
        props.insert("resource".to_string(), resource.clone());
    }
    if let Some(collection) = result.collection() {
        props.insert("collection".to_string(), collection.clone());
    }
    for (k, v) in base.iter().chain(explicit.iter()) {
        props.insert(k.clone(), v.clone());
    }
    JsonValue::Object(props)
}
