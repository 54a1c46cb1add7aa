// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::routes::auth::UserResponse;
use crate::routes::{
    doses, expenditures, farmers, ledger, plantations, products, sales, schedules, soil,
};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .merge(farmers::routes())
        .merge(plantations::routes())
        .merge(soil::routes())
        .merge(products::routes())
        .merge(sales::routes())
        .merge(expenditures::routes())
        .merge(doses::routes())
        .merge(schedules::routes())
        .merge(ledger::routes())
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .repo::<User>()
        .get(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile.into()))
}
