// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Declarative controller actions.
//!
//! An action is declared once through [`ActionBuilder`] directives and
//! stored in an [`ActionRegistry`]. At request time a [`Controller`]
//! interprets it:
//!
//! 1. authentication / authorization guards (unless skipped)
//! 2. before-callbacks, in order
//! 3. the parameter bag (`id` plus the permitted parameters)
//! 4. the service, normalized into an [`ExecutionResult`](crate::ExecutionResult)
//! 5. the page config (page directive or the result's `page_config`,
//!    then the modifier)
//! 6. after-callbacks, in order
//!
//! Any error along the way is caught and classified, and the outcome is
//! dispatched to the handler declared for the negotiated format.
//!
//! # Example
//!
//! ```rust
//! use better_controller::actions::{ActionRegistry, Controller, HandlerDescriptor};
//! use better_controller::{ActionRequest, ErrorKind, ExecutionResult, ResponseFormat, ServiceContext};
//!
//! let mut registry = ActionRegistry::new();
//! registry.define("create", |a| {
//!     a.service(|ctx: &ServiceContext| Ok(ExecutionResult::success().with_resource(ctx.params.clone())))
//!         .params_key("user")
//!         .permit(["name"])
//!         .on_success(|f| {
//!             f.html(HandlerDescriptor::redirect_to("/users").with_notice("Created"));
//!         })
//!         .on_error(ErrorKind::Validation, |f| {
//!             f.html(HandlerDescriptor::render_page());
//!         });
//! });
//!
//! let controller = Controller::new("users", registry);
//! let request = ActionRequest::new("POST", "/users")
//!     .with_params(serde_json::json!({ "user": { "name": "Ada" } }))
//!     .with_format(ResponseFormat::Html);
//! assert!(controller.execute("create", &request).unwrap().is_redirect());
//! ```

mod builder;
mod config;
mod context;
mod dispatcher;
mod executor;
mod registry;

pub use builder::{ActionBuilder, FormatBuilder};
pub use config::{
    ActionConfiguration, AfterCallback, BeforeCallback, FormatHandlers, Guard, HandlerBlock, HandlerDescriptor,
    PageConfigModifier, RedirectOptions, RedirectPath,
};
pub use context::HandlerContext;
pub use executor::{Controller, Execution};
pub use registry::ActionRegistry;
