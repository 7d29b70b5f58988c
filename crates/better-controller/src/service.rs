// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The contract between actions and caller-supplied services.

use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::error::ActionError;
use crate::result::ExecutionResult;

/// Everything a service receives.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Name of the action invoking the service.
    pub action: String,
    /// The permitted parameter bag.
    pub params: JsonValue,
    /// The current user, if any.
    pub current_user: Option<JsonValue>,
}

/// Business logic invoked by an action.
///
/// Any `Fn(&ServiceContext) -> Result<ExecutionResult, ActionError>` closure
/// is a service.
///
/// # Example
///
/// ```rust
/// use better_controller::{ExecutionResult, Service, ServiceContext};
///
/// let create = |ctx: &ServiceContext| {
///     Ok(ExecutionResult::success().with_resource(ctx.params.clone()))
/// };
/// let ctx = ServiceContext {
///     action: "create".into(),
///     params: serde_json::json!({ "name": "X" }),
///     current_user: None,
/// };
/// assert!(create.call(&ctx).unwrap().is_success_flag());
/// ```
pub trait Service: Send + Sync {
    /// Runs the service.
    fn call(&self, ctx: &ServiceContext) -> Result<ExecutionResult, ActionError>;
}

impl<F> Service for F
where
    F: Fn(&ServiceContext) -> Result<ExecutionResult, ActionError> + Send + Sync,
{
    fn call(&self, ctx: &ServiceContext) -> Result<ExecutionResult, ActionError> {
        self(ctx)
    }
}

/// Shared service handle stored in action configurations.
pub type SharedService = Arc<dyn Service>;

/// Wraps a service that returns raw JSON.
///
/// The value is normalized with [`ExecutionResult::from_value`]: `null` and
/// non-object values become `{}`.
pub fn json_service<F>(f: F) -> impl Service
where
    F: Fn(&ServiceContext) -> Result<JsonValue, ActionError> + Send + Sync,
{
    move |ctx: &ServiceContext| f(ctx).map(ExecutionResult::from_value)
}
