// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP adapter components.
//!
//! # Components
//!
//! - `body_parser`: query strings, form and JSON bodies into params
//! - `http`: request/response conversion
//! - `routes`: mounting controller actions on an axum router

/// Request body parsing for form data and JSON.
pub mod body_parser;
/// Request and response conversion.
pub mod http;
/// Route table for controller actions.
pub mod routes;

pub use routes::{ActionRoutes, CurrentUserResolver};
