// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! axum adapter and demo server for BetterController.
//!
//! # Usage
//!
//! ```bash
//! better-controller serve            # run the demo on 127.0.0.1:3000
//! better-controller serve --port 8080
//! better-controller routes           # list the demo routes
//! ```
//!
//! # Configuration
//!
//! Settings are read from `better_controller.toml` in the working directory.

/// CLI commands (serve, routes).
pub mod commands;
/// Configuration from `better_controller.toml`.
pub mod config;
/// In-memory articles controller.
pub mod demo;
/// HTTP adapter.
pub mod server;
