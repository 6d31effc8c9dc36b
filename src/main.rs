// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Where-is-everyone API Server
//!
//! Lets users share their position and a short status with the people
//! they mutually observe.

use where_is_everyone::{config::Config, db, services::SystemClock, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment
    let config = Config::from_env()?;

    // Initialize structured JSON logging for GCP
    init_logging(config.debug)?;
    tracing::info!(
        port = config.port,
        backend = ?config.storage_backend,
        "Starting where-is-everyone API"
    );

    let storage = db::connect(&config).await?;

    // Unique username index; must exist before the first sign-up is served
    storage.identities.ensure_indexes().await?;
    tracing::info!("Storage indexes ensured");

    let state = Arc::new(AppState::new(
        config.clone(),
        storage,
        Arc::new(SystemClock),
    ));

    // Build router
    let app = where_is_everyone::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging(debug: bool) -> Result<(), tracing_subscriber::filter::ParseError> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let crate_level = if debug { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("where_is_everyone={}", crate_level).parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
