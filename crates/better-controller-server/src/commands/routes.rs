// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Prints the demo controller's routes and declared actions.

use crate::demo::{self, ArticleStore};

/// Prints one line per route.
pub fn run() -> anyhow::Result<()> {
    let store = ArticleStore::default();
    let routes = demo::article_routes(&store);
    for (path, action) in routes.describe() {
        println!("{:<20} articles#{}", path, action);
    }

    let registry = demo::article_actions(&store);
    println!("\n{} action(s): {}", registry.len(), registry.names().join(", "));
    Ok(())
}
