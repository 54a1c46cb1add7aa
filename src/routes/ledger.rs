// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Farmer ledger report.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::user::modules;
use crate::models::ScheduleKind;
use crate::services::ledger::{farmer_ledger, FarmerLedger};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ledger/{farmer_id}", get(get_ledger))
}

async fn get_ledger(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(farmer_id): Path<String>,
) -> Result<Json<FarmerLedger>> {
    user.require_module(modules::LEDGER)?;
    let ledger = farmer_ledger(
        &state.db,
        state.schedules.synthesizer(ScheduleKind::Crop),
        &farmer_id,
    )
    .await?;
    Ok(Json(ledger))
}
