// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! - `serve`: run the demo articles controller over HTTP
//! - `routes`: print the demo route table

/// Route listing command.
pub mod routes;
/// HTTP server command.
pub mod serve;
