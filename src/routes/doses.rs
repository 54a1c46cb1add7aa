// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bycell dose application headers. The activities themselves are edited
//! through the schedule routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::modules;
use crate::models::{DoseApplication, Farmer};
use crate::routes::{farmers::delete_dose_cascade, DeleteResponse};
use crate::time_utils::{format_date, local_now};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/doses", get(list_doses)).route(
        "/api/doses/{farmer_id}",
        get(get_dose).put(update_dose).delete(delete_dose),
    )
}

async fn list_doses(State(state): State<Arc<AppState>>) -> Result<Json<Vec<DoseApplication>>> {
    let mut doses = state.db.repo::<DoseApplication>().list().await?;
    doses.sort_by(|a, b| a.farmer_id.cmp(&b.farmer_id));
    Ok(Json(doses))
}

/// The farmer's dose application; an unsaved blank one if none exists yet.
async fn get_dose(
    State(state): State<Arc<AppState>>,
    Path(farmer_id): Path<String>,
) -> Result<Json<DoseApplication>> {
    Ok(Json(load_or_new(&state, &farmer_id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDoseRequest {
    #[validate(length(max = 20))]
    pub acres: Option<String>,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

async fn update_dose(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(farmer_id): Path<String>,
    Json(payload): Json<UpdateDoseRequest>,
) -> Result<Json<DoseApplication>> {
    user.require_module(modules::BYCELL)?;
    payload.validate()?;

    let mut dose = load_or_new(&state, &farmer_id).await?;
    if let Some(acres) = payload.acres {
        dose.acres = acres.trim().to_string();
    }
    if let Some(remarks) = payload.remarks {
        dose.remarks = remarks;
    }
    if dose.date.is_empty() {
        dose.date = format_date(local_now().date());
    }

    state.db.repo::<DoseApplication>().put(&dose).await?;
    tracing::info!(dose_id = %dose.id, acres = %dose.acres, "Saved dose application");
    Ok(Json(dose))
}

async fn delete_dose(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(farmer_id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    user.require_module(modules::BYCELL)?;

    let deleted = delete_dose_cascade(&state, &farmer_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!(
            "dose application {}",
            DoseApplication::id_for_farmer(&farmer_id)
        )));
    }
    tracing::info!(farmer_id = %farmer_id, deleted, "Deleted dose application");
    Ok(Json(DeleteResponse { deleted }))
}

async fn load_or_new(state: &AppState, farmer_id: &str) -> Result<DoseApplication> {
    let dose_id = DoseApplication::id_for_farmer(farmer_id);
    if let Some(dose) = state.db.repo::<DoseApplication>().get(&dose_id).await? {
        return Ok(dose);
    }
    state
        .db
        .repo::<Farmer>()
        .get(farmer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("farmer {}", farmer_id)))?;
    Ok(DoseApplication::new(farmer_id))
}
