// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for BetterController.
//!
//! Two families of errors live here:
//!
//! - [`BetterControllerError`]: configuration and lookup failures that are
//!   returned to the caller (unknown action, unreadable config file, ...).
//! - [`ActionError`]: failures raised *inside* an action pipeline (guards,
//!   callbacks, services, pages, handlers). These never escape an action;
//!   they are classified into an [`ErrorKind`] and routed to a failure
//!   handler.
//!
//! # Classification
//!
//! Every failed execution maps to exactly one [`ErrorKind`]. Errors carry
//! their kind explicitly through [`HasErrorKind`]. Collaborators that can
//! only report a type name go through [`ErrorKind::from_type_name`], a fixed
//! compatibility table.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

use crate::result::ExecutionResult;

/// The four-way failure classification used to pick a status code and a
/// failure handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid input or failed model validation (422).
    Validation,
    /// The requested record does not exist (404).
    NotFound,
    /// The current user may not perform the action (403).
    Authorization,
    /// Catch-all (500).
    Any,
}

impl ErrorKind {
    /// HTTP status for this classification.
    pub const fn status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Authorization => 403,
            Self::Validation => 422,
            Self::Any => 500,
        }
    }

    /// Classifies a legacy error by its exception type name.
    ///
    /// Matching is exact; unknown names fall back to [`ErrorKind::Any`].
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "ActiveRecord::RecordInvalid"
            | "ActiveModel::ValidationError"
            | "BetterController::ValidationError" => Self::Validation,
            "ActiveRecord::RecordNotFound"
            | "ActionController::RoutingError"
            | "BetterController::NotFoundError" => Self::NotFound,
            "Pundit::NotAuthorizedError"
            | "CanCan::AccessDenied"
            | "BetterController::AuthorizationError" => Self::Authorization,
            _ => Self::Any,
        }
    }

    /// Snake-case tag (`validation`, `not_found`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Authorization => "authorization",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by errors that know their own classification.
pub trait HasErrorKind {
    /// Returns the classification tag of this error.
    fn error_kind(&self) -> ErrorKind;
}

/// An error raised while running an action pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// Input failed validation. `errors` holds field-level details.
    #[error("{message}")]
    Validation {
        /// Human readable summary.
        message: String,
        /// Field errors, usually `{ "field": ["message", ...] }`.
        errors: JsonValue,
    },

    /// A record could not be found.
    #[error("{0}")]
    NotFound(String),

    /// The current user is not allowed to perform the action.
    #[error("{0}")]
    Unauthorized(String),

    /// Error reported by a collaborator that only exposes a type name.
    #[error("{message}")]
    Raised {
        /// Exception type name, e.g. `ActiveRecord::RecordNotFound`.
        type_name: String,
        /// Error message.
        message: String,
        /// Captured backtrace lines, if any.
        backtrace: Vec<String>,
    },

    /// Any other failure.
    #[error("{0}")]
    Message(String),
}

impl ActionError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>, errors: JsonValue) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates an authorization error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a legacy error classified by type name.
    pub fn raised(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Raised {
            type_name: type_name.into(),
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    /// Creates a catch-all error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Attaches backtrace lines to a [`ActionError::Raised`] error.
    /// Other variants are returned unchanged.
    pub fn with_backtrace(mut self, lines: Vec<String>) -> Self {
        if let Self::Raised { backtrace, .. } = &mut self {
            *backtrace = lines;
        }
        self
    }

    /// Type name reported in JSON error payloads.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Validation { .. } => "BetterController::ValidationError",
            Self::NotFound(_) => "BetterController::NotFoundError",
            Self::Unauthorized(_) => "BetterController::AuthorizationError",
            Self::Raised { type_name, .. } => type_name,
            Self::Message(_) => "BetterController::Error",
        }
    }

    /// Field errors carried by a validation error.
    pub fn field_errors(&self) -> Option<&JsonValue> {
        match self {
            Self::Validation { errors, .. } if !is_blank(errors) => Some(errors),
            _ => None,
        }
    }

    /// Backtrace lines, empty when none were captured.
    pub fn backtrace(&self) -> &[String] {
        match self {
            Self::Raised { backtrace, .. } => backtrace,
            _ => &[],
        }
    }
}

impl HasErrorKind for ActionError {
    fn error_kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::Raised { type_name, .. } => ErrorKind::from_type_name(type_name),
            Self::Message(_) => ErrorKind::Any,
        }
    }
}

/// Picks the classification of a failed execution.
///
/// An error, when present, decides. Otherwise a result carrying non-empty
/// `errors` is a validation failure, and anything else is `Any`.
pub fn classify(error: Option<&ActionError>, result: &ExecutionResult) -> ErrorKind {
    match error {
        Some(err) => err.error_kind(),
        None if result.errors().is_some() => ErrorKind::Validation,
        None => ErrorKind::Any,
    }
}

/// True for `null`, empty strings, arrays and objects.
pub(crate) fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// The crate-level error type.
#[derive(Error, Debug)]
pub enum BetterControllerError {
    /// No action with this name was registered on the controller.
    #[error("Action not registered: {0}")]
    ActionNotRegistered(String),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] toml::de::Error),

    /// JSON serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// CSV export received rows it cannot tabulate.
    #[error("CSV export error: {0}")]
    CsvError(String),
}

/// Convenience type alias for Results with [`BetterControllerError`].
pub type Result<T> = std::result::Result<T, BetterControllerError>;
