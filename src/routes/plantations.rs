// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plantations and the removal of their crop schedules.

use crate::db::FieldFilter;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::modules;
use crate::models::{Farmer, Plantation, ScheduleKind};
use crate::routes::{new_id, DeleteResponse};
use crate::time_utils::parse_date;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/plantations",
            get(list_plantations).post(save_plantation),
        )
        .route("/api/plantations/{id}", delete(delete_plantation))
}

#[derive(Deserialize)]
struct PlantationQuery {
    farmer_id: Option<String>,
}

async fn list_plantations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlantationQuery>,
) -> Result<Json<Vec<Plantation>>> {
    let repo = state.db.repo::<Plantation>();
    let mut plantations = match params.farmer_id.as_deref() {
        Some(farmer_id) => {
            repo.list_where(&[FieldFilter::eq("farmer_id", farmer_id)])
                .await?
        }
        None => repo.list().await?,
    };
    plantations.sort_by(|a, b| {
        a.plantation_date
            .cmp(&b.plantation_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(Json(plantations))
}

/// Create a plantation, or update one when `id` is set.
async fn save_plantation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut plantation): Json<Plantation>,
) -> Result<Json<Plantation>> {
    user.require_module(modules::PLANTATION)?;
    plantation.validate()?;

    if !plantation.plantation_date.is_empty() && parse_date(&plantation.plantation_date).is_none()
    {
        return Err(AppError::BadRequest(format!(
            "invalid plantation date {:?}",
            plantation.plantation_date
        )));
    }

    if state
        .db
        .repo::<Farmer>()
        .get(&plantation.farmer_id)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(format!(
            "unknown farmer {}",
            plantation.farmer_id
        )));
    }

    let repo = state.db.repo::<Plantation>();
    let previous = if plantation.id.is_empty() {
        plantation.id = new_id();
        None
    } else {
        repo.get(&plantation.id).await?
    };

    repo.put(&plantation).await?;

    // Open schedules follow the stored land area
    if previous.is_some_and(|p| p.land_area != plantation.land_area) {
        state.schedules.refresh_acreage(
            ScheduleKind::Crop,
            &plantation.id,
            &plantation.land_area,
        );
    }
    tracing::info!(
        plantation_id = %plantation.id,
        farmer_id = %plantation.farmer_id,
        user = %user.username,
        "Saved plantation"
    );
    Ok(Json(plantation))
}

async fn delete_plantation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    user.require_module(modules::PLANTATION)?;

    if state.db.repo::<Plantation>().get(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("plantation {}", id)));
    }

    let deleted = delete_cascade(&state, &id).await?;
    tracing::info!(plantation_id = %id, deleted, user = %user.username, "Deleted plantation");
    Ok(Json(DeleteResponse { deleted }))
}

/// Delete a plantation and its crop records, and drop any open working
/// sets for it. Returns the number of documents removed.
pub(crate) async fn delete_cascade(state: &AppState, plantation_id: &str) -> Result<usize> {
    let records = state
        .db
        .records(ScheduleKind::Crop)
        .delete_records(plantation_id)
        .await?;
    state.db.repo::<Plantation>().delete(plantation_id).await?;
    state
        .schedules
        .forget_parent(ScheduleKind::Crop, plantation_id);

    tracing::debug!(plantation_id, records, "Cascaded plantation delete");
    Ok(records + 1)
}
