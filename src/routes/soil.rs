// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Soil health test results.

use crate::db::FieldFilter;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::modules;
use crate::models::SoilTest;
use crate::routes::{new_id, DeleteResponse};
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
        .route("/api/soil-tests", get(list_soil_tests).post(save_soil_test))
        .route("/api/soil-tests/{id}", delete(delete_soil_test))
}

#[derive(Deserialize)]
struct SoilQuery {
    farmer_id: Option<String>,
}

async fn list_soil_tests(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SoilQuery>,
) -> Result<Json<Vec<SoilTest>>> {
    let repo = state.db.repo::<SoilTest>();
    let mut tests = match params.farmer_id.as_deref() {
        Some(farmer_id) => {
            repo.list_where(&[FieldFilter::eq("farmer_id", farmer_id)])
                .await?
        }
        None => repo.list().await?,
    };
    // Newest sample first
    tests.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(tests))
}

async fn save_soil_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut test): Json<SoilTest>,
) -> Result<Json<SoilTest>> {
    user.require_module(modules::SOIL)?;
    test.validate()?;

    if test.id.is_empty() {
        test.id = new_id();
    }
    state.db.repo::<SoilTest>().put(&test).await?;
    tracing::info!(soil_test_id = %test.id, farmer_id = %test.farmer_id, "Saved soil test");
    Ok(Json(test))
}

async fn delete_soil_test(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    user.require_module(modules::SOIL)?;

    let repo = state.db.repo::<SoilTest>();
    if repo.get(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("soil test {}", id)));
    }
    repo.delete(&id).await?;
    Ok(Json(DeleteResponse { deleted: 1 }))
}
