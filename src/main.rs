// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Farm-Ledger API Server
//!
//! Serves farmer records, crop service schedules and bycell dose
//! applications to the field office frontend.

use farm_ledger::{
    config::{Config, StorageBackend},
    db::{Db, FirestoreDb},
    models::ScheduleKind,
    services::{auth, sessions::IDLE_SWEEP_INTERVAL},
    AppState,
};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.storage_backend,
        "Starting Farm-Ledger API"
    );

    let db = match config.storage_backend {
        StorageBackend::Firestore => {
            Db::new(Arc::new(FirestoreDb::new(&config.gcp_project_id).await?))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Db::in_memory()
        }
    };

    if config.seed_demo_users {
        auth::seed_demo_users(&db).await?;
    }

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db)?);
    tracing::info!(
        crop_entries = state.schedules.synthesizer(ScheduleKind::Crop).template().len(),
        dose_entries = state.schedules.synthesizer(ScheduleKind::Dose).template().len(),
        "Schedule templates loaded"
    );

    // Periodic sweep of abandoned working sets
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(IDLE_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sweeper.schedules.evict_idle(Instant::now());
        }
    });

    // Build router
    let app = farm_ledger::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["farm_ledger=debug", "info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
