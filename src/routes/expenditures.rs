// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Business expenditures and the expenditure report.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::modules;
use crate::models::Expenditure;
use crate::routes::new_id;
use crate::services::ledger::{expenditure_report, ExpenditureReport};
use crate::time_utils::{format_date, parse_date};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/expenditures",
            get(list_expenditures).post(save_expenditure),
        )
        .route("/api/expenditures/report", get(get_report))
}

async fn list_expenditures(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Expenditure>>> {
    let mut entries = state.db.repo::<Expenditure>().list().await?;
    entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(entries))
}

async fn save_expenditure(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut entry): Json<Expenditure>,
) -> Result<Json<Expenditure>> {
    user.require_module(modules::EXPENDITURE)?;
    entry.validate()?;

    entry.date = parse_date(&entry.date)
        .map(format_date)
        .ok_or_else(|| AppError::BadRequest(format!("invalid date {:?}", entry.date)))?;
    if entry.id.is_empty() {
        entry.id = new_id();
    }

    state.db.repo::<Expenditure>().put(&entry).await?;
    tracing::info!(
        expenditure_id = %entry.id,
        head = %entry.head_name,
        amount = entry.amount,
        "Saved expenditure"
    );
    Ok(Json(entry))
}

#[derive(Deserialize)]
struct ReportQuery {
    from: Option<String>,
    to: Option<String>,
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<ExpenditureReport>> {
    let from = parse_bound(params.from.as_deref())?;
    let to = parse_bound(params.to.as_deref())?;

    let entries = state.db.repo::<Expenditure>().list().await?;
    Ok(Json(expenditure_report(entries, from, to)))
}

fn parse_bound(text: Option<&str>) -> Result<Option<NaiveDate>> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(text)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("invalid date {:?}", text))),
    }
}
