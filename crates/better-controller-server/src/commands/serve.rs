// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Serves the demo articles controller.

use std::path::Path;

use better_controller::config;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::demo;

/// Runs the server until interrupted.
///
/// `host` and `port` override the values from the configuration file.
pub async fn run(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut app_config = match config_path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(host) = host {
        app_config.server.host = host;
    }
    if let Some(port) = port {
        app_config.server.port = port;
    }

    config::init(app_config.controller.clone());

    let app = demo::router().layer(TraceLayer::new_for_http());
    let addr = app_config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Listening on http://{}", addr);
    println!("BetterController demo running at http://{}", addr);
    println!("  GET    /articles          (html, ?format=json, ?format=csv)");
    println!("  POST   /articles");
    println!("  GET    /articles/:id      (html, .json)");
    println!("  DELETE /articles/:id      (needs {} header)", demo::USER_HEADER);

    axum::serve(listener, app).await?;
    Ok(())
}
