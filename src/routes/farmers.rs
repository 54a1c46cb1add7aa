// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Farmer registration.

use crate::db::FieldFilter;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::modules;
use crate::models::{DoseApplication, Farmer, Plantation, ScheduleKind};
use crate::routes::{new_id, plantations, DeleteResponse};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/farmers", get(list_farmers).post(save_farmer))
        .route("/api/farmers/{id}", get(get_farmer).delete(delete_farmer))
}

#[derive(Deserialize)]
struct FarmerQuery {
    /// Search text matched against name, phone and serial number
    q: Option<String>,
}

/// List farmers, optionally filtered by a search query, sorted by name.
async fn list_farmers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FarmerQuery>,
) -> Result<Json<Vec<Farmer>>> {
    let query = params.q.unwrap_or_default();
    let mut farmers: Vec<Farmer> = state
        .db
        .repo::<Farmer>()
        .list()
        .await?
        .into_iter()
        .filter(|f| f.matches(&query))
        .collect();
    farmers.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(Json(farmers))
}

/// Register a farmer, or update one when `id` is set.
async fn save_farmer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut farmer): Json<Farmer>,
) -> Result<Json<Farmer>> {
    user.require_module(modules::FARMERS)?;
    farmer.validate()?;

    farmer.name = farmer.name.trim().to_string();
    if farmer.id.is_empty() {
        farmer.id = new_id();
    }

    state.db.repo::<Farmer>().put(&farmer).await?;
    tracing::info!(farmer_id = %farmer.id, user = %user.username, "Saved farmer");
    Ok(Json(farmer))
}

async fn get_farmer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Farmer>> {
    let farmer = state
        .db
        .repo::<Farmer>()
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("farmer {}", id)))?;
    Ok(Json(farmer))
}

/// Delete a farmer with their plantations, dose application and every
/// activity record under them.
async fn delete_farmer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    user.require_module(modules::FARMERS)?;

    let farmers = state.db.repo::<Farmer>();
    if farmers.get(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("farmer {}", id)));
    }

    let mut deleted = 0;
    let owned = state
        .db
        .repo::<Plantation>()
        .list_where(&[FieldFilter::eq("farmer_id", &id)])
        .await?;
    for plantation in &owned {
        deleted += plantations::delete_cascade(&state, &plantation.id).await?;
    }

    deleted += delete_dose_cascade(&state, &id).await?;

    farmers.delete(&id).await?;
    deleted += 1;

    tracing::info!(
        farmer_id = %id,
        plantations = owned.len(),
        deleted,
        user = %user.username,
        "Deleted farmer"
    );
    Ok(Json(DeleteResponse { deleted }))
}

/// Delete a farmer's dose application header and its records. Returns the
/// number of documents removed.
pub(crate) async fn delete_dose_cascade(state: &AppState, farmer_id: &str) -> Result<usize> {
    let dose_id = DoseApplication::id_for_farmer(farmer_id);
    let mut deleted = state
        .db
        .records(ScheduleKind::Dose)
        .delete_records(&dose_id)
        .await?;

    let headers = state.db.repo::<DoseApplication>();
    if headers.get(&dose_id).await?.is_some() {
        headers.delete(&dose_id).await?;
        deleted += 1;
    }

    state.schedules.forget_parent(ScheduleKind::Dose, &dose_id);
    Ok(deleted)
}
