// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Product catalog.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::modules;
use crate::models::Product;
use crate::routes::{new_id, DeleteResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/products", get(list_products).post(save_product))
        .route("/api/products/{id}", delete(delete_product))
}

async fn list_products(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Product>>> {
    let mut products = state.db.repo::<Product>().list().await?;
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(products))
}

async fn save_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut product): Json<Product>,
) -> Result<Json<Product>> {
    user.require_module(modules::PRODUCTS)?;
    product.validate()?;

    if product.id.is_empty() {
        product.id = new_id();
    }
    state.db.repo::<Product>().put(&product).await?;
    tracing::info!(product_id = %product.id, rate = product.rate, "Saved product");
    Ok(Json(product))
}

/// Remove a product from the catalog. Existing invoices keep their own
/// copy of the name and rate.
async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    user.require_module(modules::PRODUCTS)?;

    let repo = state.db.repo::<Product>();
    if repo.get(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {}", id)));
    }
    repo.delete(&id).await?;
    Ok(Json(DeleteResponse { deleted: 1 }))
}
