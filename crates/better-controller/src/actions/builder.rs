// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The action declaration DSL.
//!
//! Directives are methods on [`ActionBuilder`] and [`FormatBuilder`]; a
//! directive that does not exist is a compile error.
//!
//! # Example
//!
//! ```rust
//! use better_controller::actions::{ActionRegistry, HandlerDescriptor};
//! use better_controller::{ErrorKind, ExecutionResult, ServiceContext};
//!
//! let mut registry = ActionRegistry::new();
//! registry.define("create", |a| {
//!     a.service(|ctx: &ServiceContext| Ok(ExecutionResult::success().with_resource(ctx.params.clone())))
//!         .params_key("user")
//!         .permit(["name", "email"])
//!         .on_success(|f| {
//!             f.html(HandlerDescriptor::redirect_to("/users/:id").with_notice("User created"));
//!         })
//!         .on_error(ErrorKind::Validation, |f| {
//!             f.html(HandlerDescriptor::render_page());
//!         });
//! });
//! assert!(registry.contains("create"));
//! ```

use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

use super::config::{ActionConfiguration, FormatHandlers, HandlerDescriptor};
use super::HandlerContext;
use crate::error::{ActionError, ErrorKind};
use crate::page::{ComponentSource, Page};
use crate::params::PermitSpec;
use crate::request::{ActionRequest, ResponseFormat};
use crate::response::ControllerResponse;
use crate::result::{ExecutionResult, PageConfig};
use crate::service::Service;
use crate::turbo::TurboStreamBuilder;

/// Accumulates the directives of one action.
#[derive(Debug)]
pub struct ActionBuilder {
    config: ActionConfiguration,
}

impl ActionBuilder {
    /// Starts an action declaration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: ActionConfiguration::new(name),
        }
    }

    /// Starts from an existing configuration (used when a subclass refines
    /// an inherited action).
    pub fn from_configuration(config: ActionConfiguration) -> Self {
        Self { config }
    }

    /// The service to call.
    pub fn service(&mut self, service: impl Service + 'static) -> &mut Self {
        self.config.service = Some(Arc::new(service));
        self
    }

    /// The page building the page config.
    pub fn page(&mut self, page: impl Page + 'static) -> &mut Self {
        self.config.page = Some(Arc::new(page));
        self
    }

    /// A component to render instead of a template.
    pub fn component(&mut self, name: impl Into<String>) -> &mut Self {
        self.component_with_locals(name, Map::new())
    }

    /// A component with static locals.
    pub fn component_with_locals(&mut self, name: impl Into<String>, locals: Map<String, JsonValue>) -> &mut Self {
        self.config.component = Some(ComponentSource {
            name: name.into(),
            locals,
        });
        self
    }

    /// The parameter root key.
    pub fn params_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.config.params_key = Some(key.into());
        self
    }

    /// Permits scalar fields.
    pub fn permit<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .permitted
            .extend(keys.into_iter().map(|k| PermitSpec::Key(k.into())));
        self
    }

    /// Permits an array of scalars.
    pub fn permit_array(&mut self, key: impl Into<String>) -> &mut Self {
        self.config.permitted.push(PermitSpec::Array(key.into()));
        self
    }

    /// Permits a nested object with its own permit list.
    pub fn permit_nested(&mut self, key: impl Into<String>, fields: Vec<PermitSpec>) -> &mut Self {
        self.config.permitted.push(PermitSpec::Nested(key.into(), fields));
        self
    }

    /// Adds a before-callback.
    ///
    /// An error stops the pipeline and is classified by its kind:
    /// [`ActionError::unauthorized`] answers 403, [`ActionError::not_found`]
    /// 404, and a plain [`ActionError::message`] 500.
    pub fn before<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&ActionRequest) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.config.before.push(Arc::new(f));
        self
    }

    /// Adds an after-callback.
    pub fn after<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&ActionRequest, &mut ExecutionResult) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.config.after.push(Arc::new(f));
        self
    }

    /// Adjusts the page config on every request.
    pub fn page_config<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut PageConfig, &ActionRequest) + Send + Sync + 'static,
    {
        self.config.page_config_modifier = Some(Arc::new(f));
        self
    }

    /// Declares success handlers.
    pub fn on_success(&mut self, f: impl FnOnce(&mut FormatBuilder)) -> &mut Self {
        let mut builder = FormatBuilder::from_handlers(std::mem::take(&mut self.config.on_success));
        f(&mut builder);
        self.config.on_success = builder.handlers;
        self
    }

    /// Declares failure handlers for one classification.
    pub fn on_error(&mut self, kind: ErrorKind, f: impl FnOnce(&mut FormatBuilder)) -> &mut Self {
        let existing = self.config.on_error.remove(&kind).unwrap_or_default();
        let mut builder = FormatBuilder::from_handlers(existing);
        f(&mut builder);
        self.config.on_error.insert(kind, builder.handlers);
        self
    }

    /// Declares the catch-all failure handlers.
    pub fn on_any_error(&mut self, f: impl FnOnce(&mut FormatBuilder)) -> &mut Self {
        self.on_error(ErrorKind::Any, f)
    }

    /// Skips the controller's authentication guard.
    pub fn skip_authentication(&mut self) -> &mut Self {
        self.config.skip_authentication = true;
        self
    }

    /// Skips the controller's authorization guard.
    pub fn skip_authorization(&mut self) -> &mut Self {
        self.config.skip_authorization = true;
        self
    }

    /// Finishes the declaration.
    pub fn build(self) -> ActionConfiguration {
        self.config
    }
}

/// Accumulates per-format handlers inside `on_success` / `on_error`.
#[derive(Debug, Default)]
pub struct FormatBuilder {
    handlers: FormatHandlers,
}

macro_rules! format_directives {
    ($($(#[$doc:meta])* $name:ident, $name_with:ident => $format:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, handler: HandlerDescriptor) -> &mut Self {
                self.handlers.insert($format, handler);
                self
            }

            /// Same as the plain directive, with a closure handler.
            pub fn $name_with<F>(&mut self, f: F) -> &mut Self
            where
                F: Fn(&HandlerContext<'_>) -> Result<ControllerResponse, ActionError> + Send + Sync + 'static,
            {
                self.handlers.insert($format, HandlerDescriptor::block(f));
                self
            }
        )*
    };
}

impl FormatBuilder {
    fn from_handlers(handlers: FormatHandlers) -> Self {
        Self { handlers }
    }

    format_directives! {
        /// Handler for HTML requests.
        html, html_with => ResponseFormat::Html;
        /// Handler for Turbo Stream requests.
        turbo_stream, turbo_stream_with => ResponseFormat::TurboStream;
        /// Handler for requests from inside a Turbo Frame.
        turbo_frame, turbo_frame_with => ResponseFormat::TurboFrame;
        /// Handler for JSON requests.
        json, json_with => ResponseFormat::Json;
        /// Handler for CSV requests.
        csv, csv_with => ResponseFormat::Csv;
        /// Handler for XML requests.
        xml, xml_with => ResponseFormat::Xml;
    }

    /// Shorthand for `turbo_stream(HandlerDescriptor::stream(builder))`.
    pub fn streams(&mut self, builder: TurboStreamBuilder) -> &mut Self {
        self.turbo_stream(HandlerDescriptor::stream(builder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turbo::StreamContent;
    use serde_json::json;

    #[test]
    fn test_directives_fill_configuration() {
        let mut builder = ActionBuilder::new("update");
        builder
            .service(|_: &crate::ServiceContext| Ok(ExecutionResult::success()))
            .params_key("post")
            .permit(["title", "body"])
            .permit_array("tags")
            .permit_nested("author", vec![PermitSpec::key("name")])
            .component("PostCard")
            .before(|_| Ok(()))
            .after(|_, _| Ok(()))
            .skip_authorization();
        let config = builder.build();

        assert_eq!(config.name, "update");
        assert!(config.service.is_some());
        assert_eq!(config.params_key.as_deref(), Some("post"));
        assert_eq!(config.permitted.len(), 4);
        assert_eq!(config.permitted[0], PermitSpec::key("title"));
        assert_eq!(config.component.as_ref().map(|c| c.name.as_str()), Some("PostCard"));
        assert_eq!(config.before.len(), 1);
        assert_eq!(config.after.len(), 1);
        assert!(config.skip_authorization);
        assert!(!config.skip_authentication);
    }

    #[test]
    fn test_format_handlers() {
        let mut builder = ActionBuilder::new("destroy");
        builder
            .on_success(|f| {
                f.html(HandlerDescriptor::redirect_to("/posts"))
                    .json_with(|ctx| Ok(ctx.respond_with_success(json!(null), None)))
                    .streams(TurboStreamBuilder::new().remove("post_1"));
            })
            .on_error(ErrorKind::NotFound, |f| {
                f.html(HandlerDescriptor::redirect_to("/posts").with_alert("Not found"));
            })
            .on_any_error(|f| {
                f.turbo_stream(HandlerDescriptor::stream(
                    TurboStreamBuilder::new().update("flash", StreamContent::html("oops")),
                ));
            });
        let config = builder.build();

        assert_eq!(config.on_success.len(), 3);
        assert!(matches!(
            config.success_handler(ResponseFormat::Json),
            Some(HandlerDescriptor::Block(_))
        ));
        assert!(matches!(
            config.success_handler(ResponseFormat::TurboStream),
            Some(HandlerDescriptor::TurboStreamList(ops)) if ops.len() == 1
        ));
        assert!(config.error_handler(ErrorKind::NotFound, ResponseFormat::Html).is_some());
        assert!(config.error_handler(ErrorKind::Validation, ResponseFormat::TurboStream).is_some());
    }

    #[test]
    fn test_repeated_on_error_merges() {
        let mut builder = ActionBuilder::new("create");
        builder
            .on_error(ErrorKind::Validation, |f| {
                f.html(HandlerDescriptor::render_page());
            })
            .on_error(ErrorKind::Validation, |f| {
                f.json(HandlerDescriptor::render_page());
            });
        let config = builder.build();
        assert_eq!(config.on_error[&ErrorKind::Validation].len(), 2);
    }
}
