// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schedule working sets.
//!
//! A client opens a parent's schedule, edits its private working copy and
//! commits it. Every endpoint except discard returns the whole working set
//! so the client always renders what the server holds.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::ScheduleKind;
use crate::services::{FieldEdit, WorkingSet};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, patch, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/schedules/{kind}/{parent_id}",
            delete(discard_working_set),
        )
        .route(
            "/api/schedules/{kind}/{parent_id}/open",
            post(open_working_set),
        )
        .route(
            "/api/schedules/{kind}/{parent_id}/records/{record_id}",
            patch(set_field_value),
        )
        .route(
            "/api/schedules/{kind}/{parent_id}/acreage",
            put(set_acreage),
        )
        .route("/api/schedules/{kind}/{parent_id}/rows", post(add_row))
        .route(
            "/api/schedules/{kind}/{parent_id}/rows/{record_id}",
            delete(remove_row),
        )
        .route("/api/schedules/{kind}/{parent_id}/commit", post(commit))
}

#[derive(Deserialize)]
struct OpenQuery {
    /// Overrides the parent's stored acreage
    acreage: Option<String>,
}

async fn open_working_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, parent_id)): Path<(ScheduleKind, String)>,
    Query(params): Query<OpenQuery>,
) -> Result<Json<WorkingSet>> {
    user.require_module(kind.module())?;
    let ws = state
        .schedules
        .get_working_set(&user.user_id, kind, &parent_id, params.acreage.as_deref())
        .await?;
    Ok(Json(ws))
}

async fn set_field_value(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, parent_id, record_id)): Path<(ScheduleKind, String, String)>,
    Json(edit): Json<FieldEdit>,
) -> Result<Json<WorkingSet>> {
    user.require_module(kind.module())?;
    let ws = state
        .schedules
        .set_field_value(&user.user_id, kind, &parent_id, &record_id, edit)?;
    Ok(Json(ws))
}

#[derive(Deserialize)]
struct AcreageRequest {
    acreage: String,
}

async fn set_acreage(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, parent_id)): Path<(ScheduleKind, String)>,
    Json(payload): Json<AcreageRequest>,
) -> Result<Json<WorkingSet>> {
    user.require_module(kind.module())?;
    let ws = state
        .schedules
        .set_acreage(&user.user_id, kind, &parent_id, &payload.acreage)?;
    Ok(Json(ws))
}

#[derive(Deserialize, Default)]
struct AddRowRequest {
    day_offset: Option<i64>,
}

async fn add_row(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, parent_id)): Path<(ScheduleKind, String)>,
    Json(payload): Json<AddRowRequest>,
) -> Result<Json<WorkingSet>> {
    user.require_module(kind.module())?;
    let ws = state
        .schedules
        .add_row(&user.user_id, kind, &parent_id, payload.day_offset)?;
    Ok(Json(ws))
}

async fn remove_row(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, parent_id, record_id)): Path<(ScheduleKind, String, String)>,
) -> Result<Json<WorkingSet>> {
    user.require_module(kind.module())?;
    let ws = state
        .schedules
        .remove_row(&user.user_id, kind, &parent_id, &record_id)?;
    Ok(Json(ws))
}

async fn commit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, parent_id)): Path<(ScheduleKind, String)>,
) -> Result<Json<WorkingSet>> {
    user.require_module(kind.module())?;
    let ws = state
        .schedules
        .commit(&user.user_id, kind, &parent_id)
        .await?;
    Ok(Json(ws))
}

/// Drop the working copy. Succeeds whether or not one was open.
async fn discard_working_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((kind, parent_id)): Path<(ScheduleKind, String)>,
) -> Result<StatusCode> {
    user.require_module(kind.module())?;
    let discarded = state.schedules.discard(&user.user_id, kind, &parent_id);
    tracing::debug!(kind = %kind, parent_id = %parent_id, discarded, "Discarded working set");
    Ok(StatusCode::NO_CONTENT)
}
