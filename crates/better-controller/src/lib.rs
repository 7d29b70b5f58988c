// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # BetterController
//!
//! Declarative controller actions for server-rendered web applications.
//!
//! A controller declares its actions once: which service to call, which
//! parameters to permit, which callbacks to run, and how each response
//! format (HTML, Turbo Stream, Turbo Frame, JSON, CSV, XML) answers success
//! and each kind of failure. At request time the action is interpreted and
//! produces a framework-neutral [`ControllerResponse`].
//!
//! ## Features
//!
//! - Typed action DSL (`ActionBuilder`) with per-format handlers
//! - Error classification (validation / not found / authorization / any)
//! - Page and component resolution with Turbo Frame support
//! - Turbo Stream builder
//! - JSON envelope, CSV export and pagination helpers
//!
//! ## Quick Start
//!
//! ```rust
//! use better_controller::actions::{ActionRegistry, Controller};
//! use better_controller::{ActionRequest, ExecutionResult, ResponseFormat, ServiceContext};
//!
//! let mut registry = ActionRegistry::new();
//! registry.define("create", |a| {
//!     a.service(|_: &ServiceContext| {
//!         Ok(ExecutionResult::success().with_resource(serde_json::json!({ "id": 1, "name": "X" })))
//!     });
//! });
//!
//! let controller = Controller::new("users", registry);
//! let request = ActionRequest::new("POST", "/users").with_format(ResponseFormat::Json);
//! let response = controller.execute("create", &request).unwrap();
//! assert_eq!(
//!     response.json_body().unwrap(),
//!     &serde_json::json!({
//!         "data": { "success": true, "resource": { "id": 1, "name": "X" } },
//!         "meta": { "version": "v1" }
//!     })
//! );
//! ```

/// Action DSL, registry, interpreter and dispatcher.
pub mod actions;
/// Process-wide configuration.
pub mod config;
/// CSV export.
pub mod csv_export;
/// JSON response envelope.
pub mod envelope;
/// Error types and classification.
pub mod error;
/// Pages, components and render resolution.
pub mod page;
/// Collection pagination.
pub mod pagination;
/// Parameter permitting.
pub mod params;
/// Request abstraction and format negotiation.
pub mod request;
/// Response abstraction.
pub mod response;
/// Service results and page configs.
pub mod result;
/// Service contract.
pub mod service;
/// Turbo Stream builder.
pub mod turbo;

pub use actions::{ActionRegistry, Controller, HandlerDescriptor};
pub use config::Configuration;
pub use error::{classify, ActionError, BetterControllerError, ErrorKind, HasErrorKind, Result};
pub use page::{Component, ComponentRegistry, Page, PageContext, TemplateRenderer};
pub use request::{ActionRequest, ResponseFormat};
pub use response::{ControllerResponse, Flash, Layout};
pub use result::{ExecutionResult, PageConfig};
pub use service::{Service, ServiceContext};
pub use turbo::{StreamContent, StreamTarget, TurboStreamBuilder};
