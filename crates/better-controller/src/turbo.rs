// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Turbo Stream builder.
//!
//! Collects an ordered list of stream operations and renders them as
//! `<turbo-stream>` elements. Order is preserved exactly: it is the order in
//! which the browser applies the DOM mutations.
//!
//! # Example
//!
//! ```rust
//! use better_controller::turbo::{StreamContent, StreamTarget, TurboStreamBuilder, NoContent};
//!
//! let body = TurboStreamBuilder::new()
//!     .append("messages", StreamContent::html("<p>Hi</p>"))
//!     .remove(StreamTarget::record("message", 3))
//!     .render(&NoContent)
//!     .unwrap();
//! assert_eq!(
//!     body,
//!     "<turbo-stream action=\"append\" target=\"messages\"><template><p>Hi</p></template></turbo-stream>\
//!      <turbo-stream action=\"remove\" target=\"message_3\"></turbo-stream>"
//! );
//! ```

use heck::ToSnakeCase;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::error::ActionError;

/// A Turbo Stream action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAction {
    /// Append content inside the target.
    Append,
    /// Prepend content inside the target.
    Prepend,
    /// Replace the target element.
    Replace,
    /// Replace the target's content.
    Update,
    /// Remove the target element.
    Remove,
    /// Insert content before the target.
    Before,
    /// Insert content after the target.
    After,
    /// Ask the page to refresh.
    Refresh,
}

impl StreamAction {
    /// The `action` attribute value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::Replace => "replace",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Before => "before",
            Self::After => "after",
            Self::Refresh => "refresh",
        }
    }

    /// `remove` and `refresh` never carry a template.
    pub const fn takes_content(self) -> bool {
        !matches!(self, Self::Remove | Self::Refresh)
    }
}

impl fmt::Display for StreamAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The element a stream operation targets.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamTarget {
    /// A literal DOM id.
    Id(String),
    /// A record, resolved through [`dom_id`].
    Record {
        /// Model name (`User`, `line_item`, ...).
        model: String,
        /// Record id; `None` for unsaved records.
        id: Option<JsonValue>,
        /// Optional prefix (`edit`, ...).
        prefix: Option<String>,
    },
}

impl StreamTarget {
    /// A literal DOM id.
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// A persisted record.
    pub fn record(model: impl Into<String>, id: impl Into<JsonValue>) -> Self {
        Self::Record {
            model: model.into(),
            id: Some(id.into()),
            prefix: None,
        }
    }

    /// An unsaved record (`new_user`).
    pub fn new_record(model: impl Into<String>) -> Self {
        Self::Record {
            model: model.into(),
            id: None,
            prefix: None,
        }
    }

    /// Adds a prefix to a record target. Literal ids are unchanged.
    pub fn with_prefix(mut self, new_prefix: impl Into<String>) -> Self {
        if let Self::Record { prefix, .. } = &mut self {
            *prefix = Some(new_prefix.into());
        }
        self
    }

    /// Resolves the target to a DOM id.
    pub fn resolve(&self) -> String {
        match self {
            Self::Id(id) => id.clone(),
            Self::Record { model, id, prefix } => dom_id(model, id.as_ref(), prefix.as_deref()),
        }
    }
}

impl From<&str> for StreamTarget {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for StreamTarget {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

/// DOM id for a record: `user_1`, `new_user`, `edit_user_1`.
pub fn dom_id(model: &str, id: Option<&JsonValue>, prefix: Option<&str>) -> String {
    let model = model.replace("::", "_").to_snake_case();
    let id = id.and_then(|v| match v {
        JsonValue::Null => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    });
    match (prefix, id) {
        (Some(p), Some(id)) => format!("{}_{}_{}", p, model, id),
        (Some(p), None) => format!("{}_{}", p, model),
        (None, Some(id)) => format!("{}_{}", model, id),
        (None, None) => format!("new_{}", model),
    }
}

/// Content of a stream operation.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamContent {
    /// Inline HTML used verbatim.
    Html(String),
    /// A partial rendered by the host.
    Partial {
        /// Partial name.
        name: String,
        /// Partial locals.
        locals: JsonValue,
    },
    /// A registered component.
    Component {
        /// Registered component name.
        name: String,
        /// Locals; merged with the action result when rendered by an action.
        locals: Map<String, JsonValue>,
    },
}

impl StreamContent {
    /// Inline HTML.
    pub fn html(html: impl Into<String>) -> Self {
        Self::Html(html.into())
    }

    /// A partial.
    pub fn partial(name: impl Into<String>, locals: JsonValue) -> Self {
        Self::Partial {
            name: name.into(),
            locals,
        }
    }

    /// A component with no static locals.
    pub fn component(name: impl Into<String>) -> Self {
        Self::Component {
            name: name.into(),
            locals: Map::new(),
        }
    }
}

/// One stream operation.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOperation {
    /// What to do.
    pub action: StreamAction,
    /// Where to do it. Ignored for `refresh`.
    pub target: StreamTarget,
    /// What to insert, when the action takes content.
    pub content: Option<StreamContent>,
}

/// Renders partials and components for stream content.
pub trait ContentResolver {
    /// Renders a host partial.
    fn render_partial(&self, name: &str, locals: &JsonValue) -> Result<String, ActionError>;
    /// Renders a registered component.
    fn render_component(&self, name: &str, locals: &Map<String, JsonValue>) -> Result<String, ActionError>;
}

/// A resolver for streams made of inline HTML only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

impl ContentResolver for NoContent {
    fn render_partial(&self, name: &str, _locals: &JsonValue) -> Result<String, ActionError> {
        Err(ActionError::message(format!("cannot render partial '{}': no template renderer", name)))
    }

    fn render_component(&self, name: &str, _locals: &Map<String, JsonValue>) -> Result<String, ActionError> {
        Err(ActionError::message(format!("cannot render component '{}': no component registry", name)))
    }
}

/// Accumulates stream operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurboStreamBuilder {
    operations: Vec<StreamOperation>,
}

impl TurboStreamBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing operation list.
    pub fn from_operations(operations: Vec<StreamOperation>) -> Self {
        Self { operations }
    }

    /// Adds an operation.
    pub fn push(mut self, action: StreamAction, target: impl Into<StreamTarget>, content: Option<StreamContent>) -> Self {
        self.operations.push(StreamOperation {
            action,
            target: target.into(),
            content: content.filter(|_| action.takes_content()),
        });
        self
    }

    /// `append`
    pub fn append(self, target: impl Into<StreamTarget>, content: StreamContent) -> Self {
        self.push(StreamAction::Append, target, Some(content))
    }

    /// `prepend`
    pub fn prepend(self, target: impl Into<StreamTarget>, content: StreamContent) -> Self {
        self.push(StreamAction::Prepend, target, Some(content))
    }

    /// `replace`
    pub fn replace(self, target: impl Into<StreamTarget>, content: StreamContent) -> Self {
        self.push(StreamAction::Replace, target, Some(content))
    }

    /// `update`
    pub fn update(self, target: impl Into<StreamTarget>, content: StreamContent) -> Self {
        self.push(StreamAction::Update, target, Some(content))
    }

    /// `remove`
    pub fn remove(self, target: impl Into<StreamTarget>) -> Self {
        self.push(StreamAction::Remove, target, None)
    }

    /// `before`
    pub fn before(self, target: impl Into<StreamTarget>, content: StreamContent) -> Self {
        self.push(StreamAction::Before, target, Some(content))
    }

    /// `after`
    pub fn after(self, target: impl Into<StreamTarget>, content: StreamContent) -> Self {
        self.push(StreamAction::After, target, Some(content))
    }

    /// `refresh`
    pub fn refresh(self) -> Self {
        self.push(StreamAction::Refresh, StreamTarget::Id(String::new()), None)
    }

    /// Updates the flash container with a message of the given type
    /// (`notice`, `alert`, ...).
    pub fn flash(self, target: impl Into<StreamTarget>, kind: &str, message: &str) -> Self {
        let html = format!(
            "<div class=\"flash flash-{}\" role=\"alert\">{}</div>",
            escape_html(kind),
            escape_html(message)
        );
        self.update(target, StreamContent::Html(html))
    }

    /// Updates a form-errors container from a `{ field: [messages] }` map,
    /// a list of messages or a single string.
    pub fn form_errors(self, target: impl Into<StreamTarget>, errors: &JsonValue) -> Self {
        let items: String = error_messages(errors)
            .iter()
            .map(|m| format!("<li>{}</li>", escape_html(m)))
            .collect();
        let html = format!("<div class=\"form-errors\"><ul>{}</ul></div>", items);
        self.update(target, StreamContent::Html(html))
    }

    /// Operations collected so far.
    pub fn operations(&self) -> &[StreamOperation] {
        &self.operations
    }

    /// Consumes the builder into its operations.
    pub fn into_operations(self) -> Vec<StreamOperation> {
        self.operations
    }

    /// True when no operation was added.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Renders every operation in order and concatenates the fragments.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while rendering partial or component content.
    pub fn render(&self, resolver: &dyn ContentResolver) -> Result<String, ActionError> {
        let mut out = String::new();
        for op in &self.operations {
            out.push_str(&render_operation(op, resolver)?);
        }
        Ok(out)
    }
}

/// Renders a single `<turbo-stream>` element.
pub fn render_operation(op: &StreamOperation, resolver: &dyn ContentResolver) -> Result<String, ActionError> {
    let target = op.target.resolve();
    let target_attr = if op.action == StreamAction::Refresh || target.is_empty() {
        String::new()
    } else {
        format!(" target=\"{}\"", escape_html(&target))
    };

    let content = match (&op.content, op.action.takes_content()) {
        (Some(content), true) => Some(match content {
            StreamContent::Html(html) => html.clone(),
            StreamContent::Partial { name, locals } => resolver.render_partial(name, locals)?,
            StreamContent::Component { name, locals } => resolver.render_component(name, locals)?,
        }),
        _ => None,
    };

    Ok(match content {
        Some(html) => format!(
            "<turbo-stream action=\"{}\"{}><template>{}</template></turbo-stream>",
            op.action, target_attr, html
        ),
        None => format!("<turbo-stream action=\"{}\"{}></turbo-stream>", op.action, target_attr),
    })
}

/// Flattens an errors value into display messages.
///
/// `{ "name": ["can't be blank"] }` becomes `"Name can't be blank"`; the
/// `base` key contributes its messages without a field prefix.
pub fn error_messages(errors: &JsonValue) -> Vec<String> {
    match errors {
        JsonValue::String(s) => vec![s.clone()],
        JsonValue::Array(items) => items.iter().flat_map(error_messages).collect(),
        JsonValue::Object(map) => map
            .iter()
            .flat_map(|(field, value)| {
                error_messages(value).into_iter().map(move |msg| {
                    if field == "base" {
                        msg
                    } else {
                        format!("{} {}", humanize(field), msg)
                    }
                })
            })
            .collect(),
        JsonValue::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

/// `first_name` → `First name`
pub fn humanize(field: &str) -> String {
    let spaced = field.trim_end_matches("_id").replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Escapes text for HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
